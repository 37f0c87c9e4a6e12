use aws_config::{BehaviorVersion, Region};
use aws_sdk_ssm::Client;
use aws_sdk_ssm::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_ssm::types::{ParameterType, ResourceTypeForTagging, Tag};

use crate::error::{Result, StoreError};
use crate::runtime::ASYNC_RUNTIME;
use crate::{SecretStore, Tags};

/// AWS Systems Manager Parameter Store client.
///
/// Entries are written as `SecureString` parameters when `secure` is set, so
/// encryption at rest is handled by the service's KMS integration.
pub struct SsmStore {
    client: Client,
    region: String,
    endpoint: Option<String>,
}

impl std::fmt::Debug for SsmStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsmStore")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl SsmStore {
    /// Build a client for `region`, optionally pointed at a custom endpoint.
    ///
    /// Without explicit credentials the default AWS provider chain is used
    /// (environment, profile, instance metadata).
    pub fn new(
        region: &str,
        endpoint: Option<&str>,
        credentials: Option<(&str, &str)>,
    ) -> Result<Self> {
        if region.trim().is_empty() {
            return Err(StoreError::Config("region must not be empty".into()));
        }
        let region_name = region.to_string();

        let sdk_config = ASYNC_RUNTIME.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest())
                .region(Region::new(region_name.clone()));
            if let Some((key_id, secret)) = credentials {
                loader = loader.credentials_provider(aws_sdk_ssm::config::Credentials::new(
                    key_id,
                    secret,
                    None,
                    None,
                    "sealboot-config",
                ));
            }
            loader.load().await
        });

        let mut builder = aws_sdk_ssm::config::Builder::from(&sdk_config);
        if let Some(url) = endpoint {
            builder = builder.endpoint_url(normalize_endpoint(url));
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            region: region_name,
            endpoint: endpoint.map(normalize_endpoint),
        })
    }

    /// Replace an existing parameter. The service rejects `Overwrite`
    /// together with `Tags`, so tags are attached in a second call.
    fn overwrite(
        &self,
        name: &str,
        value: &str,
        kind: ParameterType,
        tags: Vec<Tag>,
    ) -> Result<()> {
        ASYNC_RUNTIME
            .block_on(
                self.client
                    .put_parameter()
                    .name(name)
                    .value(value)
                    .r#type(kind)
                    .overwrite(true)
                    .send(),
            )
            .map_err(|e| classify("put", name, e))?;
        if !tags.is_empty() {
            ASYNC_RUNTIME
                .block_on(
                    self.client
                        .add_tags_to_resource()
                        .resource_type(ResourceTypeForTagging::Parameter)
                        .resource_id(name)
                        .set_tags(Some(tags))
                        .send(),
                )
                .map_err(|e| classify("put", name, e))?;
        }
        tracing::debug!("ssm: overwrote {name} ({} chars)", value.len());
        Ok(())
    }
}

/// Error code returned when creating a parameter whose name is taken.
const ALREADY_EXISTS_CODE: &str = "ParameterAlreadyExists";

fn is_already_exists(code: Option<&str>) -> bool {
    code == Some(ALREADY_EXISTS_CODE)
}

/// Accept bare `host[:port]` endpoints by assuming HTTPS.
fn normalize_endpoint(url: &str) -> String {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        url.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", url.trim_end_matches('/'))
    }
}

fn classify<E>(op: &'static str, name: &str, err: E) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let code = err.code().map(str::to_string);
    let message = DisplayErrorContext(&err).to_string();
    StoreError::from_code(op, name, code.as_deref(), message)
}

fn build_tags(name: &str, tags: &Tags) -> Result<Vec<Tag>> {
    tags.iter()
        .map(|(k, v)| {
            Tag::builder()
                .key(k)
                .value(v)
                .build()
                .map_err(|e| StoreError::Terminal {
                    op: "put",
                    name: name.to_string(),
                    code: "InvalidTag".into(),
                    message: e.to_string(),
                })
        })
        .collect()
}

impl SecretStore for SsmStore {
    fn put(&self, name: &str, value: &str, tags: &Tags, secure: bool) -> Result<()> {
        let tags = build_tags(name, tags)?;
        let kind = if secure {
            ParameterType::SecureString
        } else {
            ParameterType::String
        };
        let created = ASYNC_RUNTIME.block_on(
            self.client
                .put_parameter()
                .name(name)
                .value(value)
                .r#type(kind.clone())
                .set_tags((!tags.is_empty()).then(|| tags.clone()))
                .send(),
        );
        match created {
            Ok(_) => {
                tracing::debug!("ssm: put {name} ({} chars)", value.len());
                Ok(())
            }
            Err(e) if is_already_exists(e.code()) => self.overwrite(name, value, kind, tags),
            Err(e) => Err(classify("put", name, e)),
        }
    }

    fn get(&self, name: &str, decrypt: bool) -> Result<String> {
        let out = ASYNC_RUNTIME
            .block_on(
                self.client
                    .get_parameter()
                    .name(name)
                    .with_decryption(decrypt)
                    .send(),
            )
            .map_err(|e| classify("get", name, e))?;
        out.parameter()
            .and_then(|p| p.value())
            .map(str::to_string)
            .ok_or_else(|| StoreError::Terminal {
                op: "get",
                name: name.to_string(),
                code: "EmptyResponse".into(),
                message: "response carried no parameter value".into(),
            })
    }

    fn delete(&self, name: &str) -> Result<()> {
        ASYNC_RUNTIME
            .block_on(self.client.delete_parameter().name(name).send())
            .map_err(|e| classify("delete", name, e))?;
        tracing::debug!("ssm: deleted {name}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_endpoints_get_https_scheme() {
        assert_eq!(
            normalize_endpoint("ssm.us-east-1.amazonaws.com"),
            "https://ssm.us-east-1.amazonaws.com"
        );
        assert_eq!(
            normalize_endpoint("http://localhost:4566/"),
            "http://localhost:4566"
        );
    }

    #[test]
    fn empty_region_is_rejected() {
        assert!(matches!(
            SsmStore::new("  ", None, None),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn only_name_collisions_trigger_overwrite() {
        assert!(is_already_exists(Some("ParameterAlreadyExists")));
        assert!(!is_already_exists(Some("ParameterLimitExceeded")));
        assert!(!is_already_exists(Some("AccessDeniedException")));
        assert!(!is_already_exists(None));
    }

    #[test]
    fn tags_convert_in_key_order() {
        let mut tags = Tags::new();
        tags.insert("b".into(), "2".into());
        tags.insert("a".into(), "1".into());
        let built = build_tags("/p/0", &tags).unwrap();
        let keys: Vec<&str> = built.iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
