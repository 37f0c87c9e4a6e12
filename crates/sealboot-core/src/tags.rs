use sealboot_store::Tags;

const CLUSTER_TAG_PREFIX: &str = "sigs.k8s.io/cluster-api-provider-aws/cluster/";
const ROLE_TAG: &str = "sigs.k8s.io/cluster-api-provider-aws/role";
const NAME_TAG: &str = "Name";
const OWNED: &str = "owned";

/// Who a chunk group belongs to. Every entry of the group carries the same
/// tags derived from this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineIdentity {
    pub cluster: String,
    pub machine: String,
    pub role: String,
    pub additional: Tags,
}

impl MachineIdentity {
    pub fn new(cluster: &str, machine: &str, role: &str) -> Self {
        Self {
            cluster: cluster.to_string(),
            machine: machine.to_string(),
            role: role.to_string(),
            additional: Tags::new(),
        }
    }

    /// Ownership tags. Additional tags never override the built-in keys.
    pub fn tags(&self) -> Tags {
        let mut tags = self.additional.clone();
        tags.insert(format!("{CLUSTER_TAG_PREFIX}{}", self.cluster), OWNED.into());
        tags.insert(ROLE_TAG.into(), self.role.clone());
        tags.insert(NAME_TAG.into(), self.machine.clone());
        tags
    }
}
