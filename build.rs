// build.rs

//! Generates the `t!` macro from `locales/<lang>.toml`.
//!
//! The display language is fixed at build time: a `lang_*` feature wins, then
//! the `ARMSHELL_LANG` environment variable, then English. Keys missing from
//! the selected language fall back to `locales/en.toml`, and an unknown key
//! is a compile error at the `t!` call site.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

const FALLBACK_LANG: &str = "en";

fn main() {
    println!("cargo:rerun-if-env-changed=ARMSHELL_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    let lang = select_language();
    println!("cargo:rustc-env=ARMSHELL_LANG_EFFECTIVE={}", lang);

    let mut translations = read_locale(FALLBACK_LANG)
        .unwrap_or_else(|| panic!("locales/{}.toml is required", FALLBACK_LANG));
    if lang != FALLBACK_LANG {
        match read_locale(&lang) {
            Some(specific) => translations.extend(specific),
            None => println!(
                "cargo:warning=No locales/{}.toml, display strings stay in English.",
                lang
            ),
        }
    }

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("translations.rs"), render_macro(&translations))
        .expect("Failed to write translations.rs");
}

fn select_language() -> String {
    let mut features: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_LANG_").map(str::to_lowercase))
        .collect();
    features.sort();

    match features.as_slice() {
        [] => env::var("ARMSHELL_LANG").unwrap_or_else(|_| FALLBACK_LANG.to_string()),
        [only] => only.clone(),
        [first, ..] => {
            println!(
                "cargo:warning=Several language features enabled ({:?}), using '{}'.",
                features, first
            );
            first.clone()
        }
    }
}

fn read_locale(lang: &str) -> Option<BTreeMap<String, String>> {
    let path = format!("locales/{}.toml", lang);
    let content = fs::read_to_string(&path).ok()?;
    let table = toml::from_str(&content).unwrap_or_else(|e| panic!("Invalid {}: {}", path, e));
    Some(table)
}

fn render_macro(translations: &BTreeMap<String, String>) -> String {
    let mut code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in translations {
        code.push_str(&format!("    ({:?}) => {{ {:?} }};\n", key, value));
    }
    code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n",
    );
    code.push_str("}\n");
    code
}
