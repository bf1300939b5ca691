use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateArtisanProfileRequest {
    #[serde(flatten)]
    pub profile: UpdateProfileRequest,
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub portfolio_url: Option<String>,
    pub years_of_experience: Option<i32>,
}
