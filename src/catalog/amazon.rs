use super::{
    async_trait, ApiError, Catalog, CatalogError, Creator, ItemAttributes, ItemLookupResponse,
    Locale,
};
use crate::isbn::Isbn;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

const REQUEST_PATH: &str = "/onca/xml";
const API_VERSION: &str = "2013-08-01";
const USER_AGENT: &str = "wikishelf/0.1.0";

/// Product Advertising API credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub associate_tag: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("associate_tag", &self.associate_tag)
            .finish()
    }
}

pub struct AmazonClient {
    client: Client,
    credentials: Credentials,
}

impl AmazonClient {
    pub fn new(credentials: Credentials) -> Result<Self, CatalogError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            credentials,
        })
    }

    /// Build a signed ItemLookup URL (request signature version 2)
    fn signed_url(
        &self,
        locale: Locale,
        isbn: &Isbn,
        timestamp: &str,
    ) -> Result<String, CatalogError> {
        let params = BTreeMap::from([
            ("AWSAccessKeyId", self.credentials.access_key_id.as_str()),
            ("AssociateTag", self.credentials.associate_tag.as_str()),
            ("IdType", "ISBN"),
            ("ItemId", isbn.as_str()),
            ("Operation", "ItemLookup"),
            ("ResponseGroup", "Large"),
            ("SearchIndex", "All"),
            ("Service", "AWSECommerceService"),
            ("Timestamp", timestamp),
            ("Version", API_VERSION),
        ]);

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let string_to_sign = format!("GET\n{}\n{}\n{}", locale.host(), REQUEST_PATH, query);
        let signature = sign(&self.credentials.secret_access_key, &string_to_sign)?;

        Ok(format!(
            "https://{}{}?{}&Signature={}",
            locale.host(),
            REQUEST_PATH,
            query,
            urlencoding::encode(&signature)
        ))
    }
}

fn sign(secret: &str, message: &str) -> Result<String, CatalogError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| CatalogError::SigningError(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

// Both `ItemLookupResponse` and `ItemLookupErrorResponse` documents decode
// into this; the root element name is not checked.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawResponse {
    items: Option<RawItems>,
    #[serde(default)]
    error: Vec<RawError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawItems {
    request: Option<RawRequest>,
    #[serde(default)]
    item: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawRequest {
    errors: Option<RawErrors>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawErrors {
    #[serde(default)]
    error: Vec<RawError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawItem {
    item_attributes: Option<RawAttributes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawAttributes {
    #[serde(default)]
    author: Vec<String>,
    #[serde(default)]
    creator: Vec<RawCreator>,
    title: Option<String>,
    publisher: Option<String>,
    publication_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCreator {
    #[serde(rename = "@Role")]
    role: Option<String>,
    #[serde(rename = "$text", default)]
    name: String,
}

impl From<RawError> for ApiError {
    fn from(raw: RawError) -> Self {
        ApiError {
            code: raw.code,
            message: raw.message,
        }
    }
}

impl From<RawAttributes> for ItemAttributes {
    fn from(raw: RawAttributes) -> Self {
        ItemAttributes {
            authors: raw.author,
            creators: raw
                .creator
                .into_iter()
                .map(|c| Creator {
                    role: c.role,
                    name: c.name,
                })
                .collect(),
            title: raw.title,
            publisher: raw.publisher,
            publication_date: raw.publication_date,
        }
    }
}

/// Decode an ItemLookup XML document
fn parse_item_lookup(xml: &str) -> Result<ItemLookupResponse, CatalogError> {
    let raw: RawResponse = quick_xml::de::from_str(xml).map_err(|e| {
        CatalogError::ParseError(format!("Error parsing ItemLookup XML: {}", e))
    })?;

    let mut errors: Vec<ApiError> = raw.error.into_iter().map(ApiError::from).collect();
    let mut items = Vec::new();

    if let Some(raw_items) = raw.items {
        if let Some(request_errors) = raw_items.request.and_then(|r| r.errors) {
            errors.extend(request_errors.error.into_iter().map(ApiError::from));
        }
        items = raw_items
            .item
            .into_iter()
            .filter_map(|item| item.item_attributes)
            .map(ItemAttributes::from)
            .collect();
    }

    Ok(ItemLookupResponse { errors, items })
}

#[async_trait]
impl Catalog for AmazonClient {
    async fn item_lookup(
        &self,
        locale: Locale,
        isbn: &Isbn,
    ) -> Result<ItemLookupResponse, CatalogError> {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let url = self.signed_url(locale, isbn, &timestamp)?;
        debug!(%locale, %isbn, "Sending ItemLookup request to {}", locale.host());

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;

        parse_item_lookup(&text).map_err(|e| {
            if status.is_success() {
                e
            } else {
                CatalogError::ParseError(format!("HTTP {}: {}", status, e))
            }
        })
    }

    fn name(&self) -> &'static str {
        "Amazon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> AmazonClient {
        AmazonClient::new(Credentials {
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "secret/key+example".to_string(),
            associate_tag: "shelf-21".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231, test case 2
        let signature = sign("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(signature, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn test_signed_url() {
        let client = test_client();
        let url = client
            .signed_url(
                Locale::De,
                &Isbn::normalize("978-3-16-148410-0"),
                "2020-05-01T12:00:00Z",
            )
            .unwrap();

        assert_eq!(
            url,
            "https://webservices.amazon.de/onca/xml?\
             AWSAccessKeyId=AKIAEXAMPLE&AssociateTag=shelf-21&IdType=ISBN&\
             ItemId=9783161484100&Operation=ItemLookup&ResponseGroup=Large&\
             SearchIndex=All&Service=AWSECommerceService&\
             Timestamp=2020-05-01T12%3A00%3A00Z&Version=2013-08-01&\
             Signature=ZU4tUPPCpMpr9FCMoytnQQfyPGTXu8hSr3R6OcF0sd8%3D"
        );
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let output = format!("{:?}", test_client().credentials);
        assert!(output.contains("AKIAEXAMPLE"));
        assert!(!output.contains("secret/key+example"));
    }

    #[test]
    fn test_parse_item_lookup() {
        let xml = r#"<?xml version="1.0" ?>
<ItemLookupResponse xmlns="http://webservices.amazon.com/AWSECommerceService/2013-08-01">
  <OperationRequest>
    <RequestId>abc</RequestId>
  </OperationRequest>
  <Items>
    <Request>
      <IsValid>True</IsValid>
    </Request>
    <Item>
      <ASIN>3161484100</ASIN>
      <ItemAttributes>
        <Author>John Smith</Author>
        <Author>Jane Doe</Author>
        <Binding>Taschenbuch</Binding>
        <Creator Role="Herausgeber">Max Mustermann</Creator>
        <PublicationDate>2005-12</PublicationDate>
        <Publisher>Mohr Siebeck</Publisher>
        <Title>A Great Book</Title>
      </ItemAttributes>
    </Item>
  </Items>
</ItemLookupResponse>"#;

        let response = parse_item_lookup(xml).unwrap();
        assert!(!response.has_errors());
        assert_eq!(response.items.len(), 1);

        let item = response.first_item().unwrap();
        assert_eq!(item.authors, vec!["John Smith", "Jane Doe"]);
        assert_eq!(
            item.creators,
            vec![Creator {
                role: Some("Herausgeber".to_string()),
                name: "Max Mustermann".to_string(),
            }]
        );
        assert_eq!(item.title.as_deref(), Some("A Great Book"));
        assert_eq!(item.publisher.as_deref(), Some("Mohr Siebeck"));
        assert_eq!(item.publication_date.as_deref(), Some("2005-12"));
    }

    #[test]
    fn test_parse_request_errors() {
        let xml = r#"<ItemLookupResponse>
  <Items>
    <Request>
      <IsValid>True</IsValid>
      <Errors>
        <Error>
          <Code>AWS.InvalidParameterValue</Code>
          <Message>0000000000 is not a valid value for ItemId.</Message>
        </Error>
      </Errors>
    </Request>
  </Items>
</ItemLookupResponse>"#;

        let response = parse_item_lookup(xml).unwrap();
        assert!(response.has_errors());
        assert_eq!(response.errors[0].code, "AWS.InvalidParameterValue");
        assert!(response.items.is_empty());
    }

    #[test]
    fn test_parse_error_document() {
        let xml = r#"<ItemLookupErrorResponse xmlns="http://ecs.amazonaws.com/doc/2013-08-01/">
  <Error>
    <Code>SignatureDoesNotMatch</Code>
    <Message>The request signature we calculated does not match.</Message>
  </Error>
  <RequestId>abc</RequestId>
</ItemLookupErrorResponse>"#;

        let response = parse_item_lookup(xml).unwrap();
        assert!(response.has_errors());
        assert_eq!(response.errors[0].code, "SignatureDoesNotMatch");
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(matches!(
            parse_item_lookup("<ItemLookupResponse><Items></Item></ItemLookupResponse>"),
            Err(CatalogError::ParseError(_))
        ));
    }
}
