use mindchat::config::Config;
use mindchat::history::{ChatMessage, HistoryLimits, HistoryStore};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(dead_code)]
pub fn create_temp_store(limits: HistoryLimits) -> (HistoryStore, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let path = tmp.path().join("history.json");
    let store = HistoryStore::open(path, limits).expect("failed to open history store");
    (store, tmp)
}

#[allow(dead_code)]
pub fn limits(max_conversations: usize, max_favorites: usize) -> HistoryLimits {
    HistoryLimits {
        max_conversations,
        max_favorites,
        title_max_chars: 30,
    }
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Default configuration storing history under `data_dir`
#[allow(dead_code)]
pub fn config_in(data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.history.data_dir = Some(data_dir.to_path_buf());
    config
}

/// Write conversations with the given first user messages into a mode's history
#[allow(dead_code)]
pub fn seed_mode(config: &Config, mode: &str, texts: &[&str]) -> Vec<String> {
    let dir = config.history_dir().expect("history dir");
    let path = config.mode(mode).expect("mode").history_path(&dir);
    let mut store =
        HistoryStore::open(path, HistoryLimits::from(&config.history)).expect("open store");
    texts
        .iter()
        .map(|text| {
            let id = store.create().expect("create").conversation_id;
            store
                .append_message(&id, ChatMessage::user(*text))
                .expect("append");
            id
        })
        .collect()
}
