//! Integration tests for the Image Factory client
//!
//! These tests require network access to an Image Factory instance.
//! Set IMAGE_FACTORY_URL to point at a private factory (defaults to the public one).

use image_factory_client::{
    Customization, ImageFactoryClient, Schematic, SystemExtensions, DEFAULT_BASE_URL,
};

fn factory_url() -> String {
    std::env::var("IMAGE_FACTORY_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

#[tokio::test]
#[ignore] // Requires a reachable Image Factory
async fn test_create_vanilla_schematic() {
    let client = ImageFactoryClient::new(factory_url()).expect("Failed to create client");

    let id = client.create_schematic(&Schematic::default()).await
        .expect("Failed to create schematic");

    println!("Vanilla schematic: {}", id);
    assert!(id.len() >= 8);
}

#[tokio::test]
#[ignore]
async fn test_schematic_id_is_content_addressed() {
    let client = ImageFactoryClient::new(factory_url()).expect("Failed to create client");

    let schematic = Schematic {
        customization: Customization {
            extra_kernel_args: vec!["console=ttyS0".to_string()],
            system_extensions: SystemExtensions {
                official_extensions: vec!["siderolabs/iscsi-tools".to_string()],
            },
            ..Default::default()
        },
    };

    let first = client.create_schematic(&schematic).await
        .expect("Failed to create schematic");
    let second = client.create_schematic(&schematic).await
        .expect("Failed to create schematic");

    assert_eq!(first, second);
}
