use qr_core::qr_code::storage::QrStorage;

#[derive(Clone)]
pub struct ServerState {
    storage: QrStorage,
    public_base_url: Option<String>,
}

impl From<(QrStorage, Option<String>)> for ServerState {
    fn from(states: (QrStorage, Option<String>)) -> Self {
        let (storage, public_base_url) = states;
        Self {
            storage,
            public_base_url,
        }
    }
}

impl ServerState {
    pub fn storage(&self) -> &QrStorage {
        &self.storage
    }

    pub fn public_base_url(&self) -> Option<String> {
        self.public_base_url.clone()
    }
}
