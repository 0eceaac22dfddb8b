use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat, VectorDriver};
use crate::services::create_index;

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let (vector_store_connected, collection_points) =
        if let Ok(index) = create_index(&config.vector_store) {
            let connected = index.health_check().await.unwrap_or(false);
            let points = if connected {
                index.count().await.ok().flatten()
            } else {
                None
            };
            (connected, points)
        } else {
            (false, None)
        };

    let api_key_set = config.embedding.api_key.is_some() && config.generation.api_key.is_some();

    let status = StatusInfo {
        embedding_url: config.embedding.url.clone(),
        embedding_model: config.embedding.model.clone(),
        embedding_dimension: config.embedding.dimension,
        generation_url: config.generation.url.clone(),
        generation_model: config.generation.model.clone(),
        vector_store_driver: config.vector_store.driver.to_string(),
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        collection: config.vector_store.collection.clone(),
        collection_points,
        api_key_set,
    };

    print!("{}", formatter.format_status(&status));

    if !api_key_set {
        eprintln!();
        eprintln!("Hint: set DOCQA_API_KEY or OPENAI_API_KEY (a .env file works too).");
    }
    match config.vector_store.driver {
        VectorDriver::Qdrant if !vector_store_connected => {
            eprintln!("Warning: Qdrant not running. Start with: docker run -p 6334:6334 qdrant/qdrant");
        }
        VectorDriver::Memory => {
            eprintln!("Note: the memory driver keeps vectors only while `docqa serve` runs.");
        }
        VectorDriver::Qdrant => {}
    }

    Ok(())
}
