// build.rs

fn main() {
    // The headless driver needs no native libraries.
    if std::env::var_os("CARGO_FEATURE_X11").is_none() {
        return;
    }

    // --- Link against X11 and its font libraries ---
    // pkg-config first; if any probe fails fall back to plain link flags.
    let libraries = ["x11", "xft", "fontconfig", "freetype2"];

    let mut pkg_config_success = true;

    for lib in &libraries {
        if pkg_config::probe_library(lib).is_err() {
            eprintln!(
                "pkg-config failed for library '{}'. Falling back to manual linking.",
                lib
            );
            pkg_config_success = false;
            break;
        }
    }

    if !pkg_config_success {
        println!("cargo:rustc-link-lib=X11");
        println!("cargo:rustc-link-lib=Xft");
        println!("cargo:rustc-link-lib=fontconfig");
        println!("cargo:rustc-link-lib=freetype");
        println!("cargo:rustc-link-search=/usr/lib");
        eprintln!(
            "Manual linking flags applied. Ensure X11, Xft, Fontconfig, and Freetype development libraries are installed."
        );
    } else {
        eprintln!("pkg-config successfully found libraries. Linking configured automatically.");
    }
}
