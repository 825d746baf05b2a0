use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    pub textgen_api_key: Option<String>,
    pub data_folder: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        dotenvy::dotenv().ok();

        // Missing key is not an error: the composer falls back to the
        // default thank-you sentence.
        let textgen_api_key = std::env::var("TEXTGEN_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let data_folder =
            base_dir.join(std::env::var("DATA_FOLDER").unwrap_or_else(|_| "data".to_string()));

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5002".to_string())
            .parse()
            .unwrap_or(5002);

        Ok(Self {
            textgen_api_key,
            data_folder,
            host,
            port,
        })
    }
}
