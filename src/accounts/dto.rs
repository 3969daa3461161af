use serde::{Deserialize, Deserializer};

/// Request body for connecting a household.
#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub household_id: String,
    pub inventory_url: String,
    #[serde(default)]
    pub slack_channel: Option<String>,
    #[serde(default)]
    pub auto_notify: Option<bool>,
}

/// Partial settings update; an explicit `null` channel clears it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default, deserialize_with = "present")]
    pub slack_channel: Option<Option<String>>,
    #[serde(default)]
    pub auto_notify: Option<bool>,
}

fn present<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<String>>, D::Error> {
    Option::<String>::deserialize(d).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct HouseholdQuery {
    #[serde(default)]
    pub household_id: String,
}
