use serde::{Deserialize, Serialize};

use rakorean_core::identity::Principal;

/// Session handed over by the main app after login.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionRequest {
    pub access_token: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl From<SessionRequest> for Principal {
    fn from(request: SessionRequest) -> Self {
        Principal {
            id: request.user_id,
            display_name: request.display_name,
            email: request.email,
            access_token: request.access_token,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub signed_in: bool,
    pub principal: Option<Principal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPostRequest {
    /// Category slug, like `grammar` or `kcontent`
    pub category: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCommentRequest {
    pub content: String,
}
