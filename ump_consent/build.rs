use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::{env, fs};
use walkdir::WalkDir;

const DATA_DIR: &str = "tests/data";

/// Fixture directories under `DATA_DIR`, with the `tests/common` type checking their files.
const SUITES: [(&str, &str); 2] = [("decisions", "DecisionCase"), ("headers", "HeaderCase")];

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo::rerun-if-changed={DATA_DIR}");

    let suites = SUITES.iter().map(|&(dir, case)| generate_suite(dir, case));
    let token_stream = quote! {
        #(#suites)*
    };
    let syntax_tree = syn::parse2(token_stream)?;
    let pretty = prettyplease::unparse(&syntax_tree);

    let out_dir = env::var("OUT_DIR")?;
    fs::write(Path::new(&out_dir).join("fixture_tests.rs"), pretty)?;

    Ok(())
}

/// A module holding one test per fixture of `dir`.
fn generate_suite(dir: &str, case: &str) -> TokenStream {
    let module = format_ident!("{}", dir);
    let case = format_ident!("{}", case);
    let test_cases = fixture_files(&Path::new(DATA_DIR).join(dir)).filter_map(|path| {
        let name = path.file_stem()?.to_str()?.to_string();
        let path = path.to_str()?.to_string();
        Some(quote! {
            #[test_case(#path ; #name)]
        })
    });

    quote! {
        mod #module {
            use test_case::test_case;
            #(#test_cases)*
            fn fixture(filename: &str) {
                crate::common::#case::load_from_file(filename).unwrap().assert_json_matches();
            }
        }
    }
}

fn fixture_files(dir: &Path) -> impl Iterator<Item = PathBuf> + use<> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .flatten()
        .filter(|entry| {
            entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "json")
        })
        .map(|e| e.into_path())
}
