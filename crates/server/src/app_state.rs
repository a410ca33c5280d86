use std::{collections::HashMap, sync::Arc};

use server_api::ApiContext;
use shared::domain::{Identity, Role};

use crate::session::SessionStore;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) sessions: SessionStore,
    pub(crate) users: Arc<HashMap<String, Role>>,
}

impl AppState {
    pub(crate) fn new(api: ApiContext, sessions: SessionStore, users: Vec<Identity>) -> Self {
        let users = users
            .into_iter()
            .map(|identity| (identity.username, identity.role))
            .collect();
        Self {
            api,
            sessions,
            users: Arc::new(users),
        }
    }
}
