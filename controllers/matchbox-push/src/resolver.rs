//! Schematic resolution backed by the Image Factory.

use image_factory_client::{
    Customization, ImageFactoryClientTrait, MetaValue, Schematic, SystemExtensions,
};
use matchbox_push::{PushRequest, SchematicError, SchematicResolver};
use std::sync::Arc;
use tracing::debug;

/// Creates schematics on the Image Factory and derives base kernel args from configuration
pub struct FactorySchematicResolver {
    client: Arc<dyn ImageFactoryClientTrait>,
    base_kernel_args: Vec<String>,
    siderolink_api_url: Option<String>,
}

impl std::fmt::Debug for FactorySchematicResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactorySchematicResolver")
            .field("factory", &self.client.base_url())
            .field("base_kernel_args", &self.base_kernel_args)
            .finish_non_exhaustive()
    }
}

impl FactorySchematicResolver {
    pub fn new(
        client: Arc<dyn ImageFactoryClientTrait>,
        base_kernel_args: Vec<String>,
        siderolink_api_url: Option<String>,
    ) -> Self {
        Self {
            client,
            base_kernel_args,
            siderolink_api_url,
        }
    }

    fn join_args(&self, tunnel_mode: bool, join_token: &str) -> Vec<String> {
        let mut args = self.base_kernel_args.clone();
        if let Some(api_url) = &self.siderolink_api_url {
            let mut arg = format!("siderolink.api={}?jointoken={}", api_url, join_token);
            if tunnel_mode {
                arg.push_str("&grpc_tunnel=true");
            }
            args.push(arg);
        }
        args
    }
}

#[async_trait::async_trait]
impl SchematicResolver for FactorySchematicResolver {
    async fn create_schematic(&self, request: &PushRequest) -> Result<String, SchematicError> {
        debug!(
            "Creating schematic for Talos {} (media {:?}, secure boot {})",
            request.talos_version, request.media_id, request.secure_boot
        );

        let mut extra_kernel_args =
            self.join_args(request.siderolink_grpc_tunnel_mode, &request.join_token);
        extra_kernel_args.extend(request.extra_kernel_args.iter().cloned());

        let schematic = Schematic {
            customization: Customization {
                extra_kernel_args,
                meta: request
                    .meta_values
                    .iter()
                    .map(|m| MetaValue { key: m.key, value: m.value.clone() })
                    .collect(),
                system_extensions: SystemExtensions {
                    official_extensions: request.extensions.clone(),
                },
            },
        };

        self.client
            .create_schematic(&schematic)
            .await
            .map_err(|e| SchematicError::Upstream(e.to_string()))
    }

    async fn base_kernel_args(
        &self,
        tunnel_mode: bool,
        join_token: &str,
    ) -> Result<Vec<String>, SchematicError> {
        if self.siderolink_api_url.is_some() && join_token.is_empty() {
            return Err(SchematicError::KernelArgs("join token is required".to_string()));
        }
        Ok(self.join_args(tunnel_mode, join_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_factory_client::MockImageFactoryClient;
    use matchbox_push::MetaValue as RequestMeta;

    fn request() -> PushRequest {
        PushRequest {
            extensions: vec!["siderolabs/iscsi-tools".to_string()],
            extra_kernel_args: vec!["console=ttyS0".to_string()],
            meta_values: vec![RequestMeta { key: 10, value: "rack-a".to_string() }],
            talos_version: "1.9.0".to_string(),
            siderolink_grpc_tunnel_mode: true,
            join_token: "join-me".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_schematic_maps_request() {
        let mock = MockImageFactoryClient::new("http://factory", "abcdef1234567890");
        let resolver = FactorySchematicResolver::new(
            Arc::new(mock.clone()),
            vec!["talos.events.sink=[fdae::1]:8090".to_string()],
            Some("https://omni.example/".to_string()),
        );

        let id = resolver.create_schematic(&request()).await.unwrap();
        assert_eq!(id, "abcdef1234567890");

        let created = mock.created();
        assert_eq!(created.len(), 1);
        let customization = &created[0].customization;
        assert_eq!(
            customization.extra_kernel_args,
            vec![
                "talos.events.sink=[fdae::1]:8090",
                "siderolink.api=https://omni.example/?jointoken=join-me&grpc_tunnel=true",
                "console=ttyS0",
            ]
        );
        assert_eq!(customization.meta, vec![MetaValue { key: 10, value: "rack-a".to_string() }]);
        assert_eq!(customization.system_extensions.official_extensions, vec!["siderolabs/iscsi-tools"]);
    }

    #[tokio::test]
    async fn test_create_schematic_upstream_failure() {
        let mock = MockImageFactoryClient::new("http://factory", "unused").failing(500, "boom");
        let resolver = FactorySchematicResolver::new(Arc::new(mock), Vec::new(), None);

        let err = resolver.create_schematic(&request()).await.unwrap_err();
        assert!(matches!(err, SchematicError::Upstream(msg) if msg.contains("boom")));
    }

    #[tokio::test]
    async fn test_base_kernel_args() {
        let mock = MockImageFactoryClient::new("http://factory", "abcdef1234567890");
        let resolver = FactorySchematicResolver::new(
            Arc::new(mock),
            vec!["talos.events.sink=[fdae::1]:8090".to_string()],
            Some("https://omni.example/".to_string()),
        );

        let args = resolver.base_kernel_args(false, "join-me").await.unwrap();
        assert_eq!(args[1], "siderolink.api=https://omni.example/?jointoken=join-me");

        let err = resolver.base_kernel_args(false, "").await.unwrap_err();
        assert!(matches!(err, SchematicError::KernelArgs(_)));
    }

    #[tokio::test]
    async fn test_base_kernel_args_without_siderolink() {
        let mock = MockImageFactoryClient::new("http://factory", "abcdef1234567890");
        let resolver = FactorySchematicResolver::new(Arc::new(mock), Vec::new(), None);
        assert!(resolver.base_kernel_args(true, "").await.unwrap().is_empty());
    }
}
