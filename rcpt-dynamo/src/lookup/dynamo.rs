use std::{error::Error, fmt::Debug};

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::{
    Client,
    config::retry::RetryConfig,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::AttributeValue,
};
use rcpt_dynamo_common::{TransportError, internal};

use super::{GetItem, Item, KeyValueStore};

/// Placeholder the projection goes through, so key attributes named after
/// DynamoDB reserved words (`name`, `key`, ...) are still accepted
const KEY_PLACEHOLDER: &str = "#k";

/// DynamoDB-backed key store
///
/// One `GetItem` call per lookup, with the SDK's default timeouts. The SDK's
/// own retry layer is switched off so a failure surfaces on first attempt,
/// whatever the client was built with.
#[derive(Clone, Debug)]
pub struct DynamoStore {
    client: Client,
}

impl DynamoStore {
    pub fn new(client: &Client) -> Self {
        let config = client
            .config()
            .to_builder()
            .retry_config(RetryConfig::disabled())
            .build();

        Self {
            client: Client::from_conf(config),
        }
    }

    /// Build a client from the standard AWS provider chain
    pub async fn connect(region: Option<String>, endpoint_url: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }

        if let Some(endpoint_url) = endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let config = loader.load().await;
        internal!(
            level = DEBUG,
            "DynamoDB client configured for region {:?}",
            config.region()
        );

        Self::new(&Client::new(&config))
    }
}

#[async_trait]
impl KeyValueStore for DynamoStore {
    async fn get(&self, request: &GetItem) -> Result<Option<Item>, TransportError> {
        let output = self
            .client
            .get_item()
            .table_name(&*request.table_name)
            .key(&*request.key_name, AttributeValue::S(request.key.clone()))
            .projection_expression(KEY_PLACEHOLDER)
            .expression_attribute_names(KEY_PLACEHOLDER, &*request.projection)
            .send()
            .await
            .map_err(|err| {
                internal!(
                    level = DEBUG,
                    "GetItem on {} failed: {}",
                    request.table_name,
                    DisplayErrorContext(&err)
                );
                TransportError::new(describe(&err))
            })?;

        Ok(output.item().map(|attributes| Item {
            key: attributes
                .get(&*request.projection)
                .and_then(|value| value.as_s().ok())
                .cloned()
                .unwrap_or_else(|| request.key.clone()),
        }))
    }
}

/// A one-line description of a failed call
///
/// Service errors give their code and message. Anything else (timeouts,
/// dispatch and response failures) gives its chain of causes. The raw HTTP
/// response the SDK keeps alongside is left out.
fn describe<E, R>(err: &SdkError<E, R>) -> String
where
    E: Error + ProvideErrorMetadata + 'static,
    R: Debug,
{
    if let Some(service) = err.as_service_error() {
        let details = service.to_string();
        return match service.message() {
            Some(message) if !details.contains(message) => format!("{details}: {message}"),
            _ => details,
        };
    }

    let mut details = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        details.push_str(": ");
        details.push_str(&cause.to_string());
        source = cause.source();
    }
    details
}
