use interviewer_api::router::ApiDoc;
use utoipa::OpenApi;

/// Writes the OpenAPI document for the interviewer API, by default to
/// `openapi.json` in the working directory.
fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    std::fs::write(&path, ApiDoc::openapi().to_pretty_json()?)?;
    println!("Wrote OpenAPI document to {path}");
    Ok(())
}
