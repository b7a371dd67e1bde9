#![forbid(unsafe_code)]

/// `embed_migrations!` is not rerun when only the SQL files change, so the
/// crate is rebuilt whenever anything under the migration directory does.
fn main() {
    println!("cargo:rerun-if-changed=./migrations");
}
