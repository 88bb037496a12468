use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=TESSERACT_LIB_DIR");
    println!("cargo:rerun-if-env-changed=TESSERACT_STATIC");

    if env::var_os("CARGO_FEATURE_TESSERACT").is_none() {
        return;
    }

    if let Some(dir) = env::var_os("TESSERACT_LIB_DIR") {
        let dir = PathBuf::from(dir);
        println!("cargo:rustc-link-search=native={}", dir.display());
    } else {
        let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
        // Homebrew keeps its prefix off the default linker path
        if target_os == "macos" {
            for prefix in ["/opt/homebrew/lib", "/usr/local/lib"] {
                println!("cargo:rustc-link-search=native={prefix}");
            }
        }
    }

    let kind = if env::var_os("TESSERACT_STATIC").is_some() {
        "static"
    } else {
        "dylib"
    };
    println!("cargo:rustc-link-lib={kind}=tesseract");
}
