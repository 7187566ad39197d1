use serde::Deserialize;

/// The subset of the instance metadata document used for registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstanceMetadata {
    pub compute: ComputeMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeMetadata {
    pub subscription_id: String,
    pub location: String,
    pub resource_group_name: String,
}

impl InstanceMetadata {
    pub fn subscription_id(&self) -> &str {
        &self.compute.subscription_id
    }

    pub fn location(&self) -> &str {
        &self.compute.location
    }

    pub fn resource_group(&self) -> &str {
        &self.compute.resource_group_name
    }
}
