//! Environment-specific service hosts and SKU constants.

use patron_types::WalletProvider;

/// Deployment environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Hosts, SKUs and sink addresses for one environment.
///
/// The SKU blobs and order addresses are opaque values minted by the
/// payment service; they are passed through bit-exact and never inspected.
#[derive(Clone, Debug)]
pub struct EnvironmentConfig {
    pub environment: Environment,
    pub payment_service_host: &'static str,
    pub promotion_service_host: &'static str,
    pub publisher_service_host: &'static str,
    pub uphold_api_host: &'static str,
    pub gemini_api_host: &'static str,
    pub bitflyer_api_host: &'static str,
    pub auto_contribute_sku: &'static str,
    pub anonymous_funds_sku: &'static str,
    pub anonymous_token_order_address: &'static str,
    uphold_token_order_address: &'static str,
    gemini_token_order_address: &'static str,
    uphold_fee_address: &'static str,
    gemini_fee_address: &'static str,
    bitflyer_fee_address: &'static str,
}

impl EnvironmentConfig {
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Development => DEVELOPMENT,
            Environment::Staging => STAGING,
            Environment::Production => PRODUCTION,
        }
    }

    pub fn payment_url(&self, path: &str) -> String {
        format!("https://{}{}", self.payment_service_host, path)
    }

    pub fn promotion_url(&self, path: &str) -> String {
        format!("https://{}{}", self.promotion_service_host, path)
    }

    pub fn publisher_url(&self, path: &str) -> String {
        format!("https://{}{}", self.publisher_service_host, path)
    }

    /// The order-receiving address for a provider, if it supports token
    /// orders at all.
    pub fn token_order_address(&self, provider: WalletProvider) -> Option<&'static str> {
        match provider {
            WalletProvider::Uphold => Some(self.uphold_token_order_address),
            WalletProvider::Gemini => Some(self.gemini_token_order_address),
            WalletProvider::Bitflyer => None,
        }
    }

    /// The sink address that receives the per-transaction contribution fee.
    pub fn contribution_fee_address(&self, provider: WalletProvider) -> &'static str {
        match provider {
            WalletProvider::Uphold => self.uphold_fee_address,
            WalletProvider::Gemini => self.gemini_fee_address,
            WalletProvider::Bitflyer => self.bitflyer_fee_address,
        }
    }
}

const DEVELOPMENT: EnvironmentConfig = EnvironmentConfig {
    environment: Environment::Development,
    payment_service_host: "payment.rewards.dev.patron.software",
    promotion_service_host: "grant.rewards.dev.patron.software",
    publisher_service_host: "publishers.dev.patron.software",
    uphold_api_host: "api-sandbox.uphold.com",
    gemini_api_host: "api.sandbox.gemini.com",
    bitflyer_api_host: "bitflyer.com",
    auto_contribute_sku:
        "AgEJYnJhdmUuY29tAiNicmF2ZSB1c2VyLXdhbGxldC12b3RlIHNrdSB0b2tlbiB2MQACFH\
         NrdT11c2VyLXdhbGxldC12b3RlAAIKcHJpY2U9MC4yNQACDGN1cnJlbmN5PUJBVAACDGRl\
         c2NyaXB0aW9uPQACGmNyZWRlbnRpYWxfdHlwZT1zaW5nbGUtdXNlAAAGINiB9dUmpqLyeS\
         EdZ23E4dPXwIBOUNJCFN9d5toIME2M",
    anonymous_funds_sku:
        "AgEJYnJhdmUuY29tAiFicmF2ZSBhbm9uLWNhcmQtdm90ZSBza3UgdG9rZW4gdjEAAhJza3\
         U9YW5vbi1jYXJkLXZvdGUAAgpwcmljZT0wLjI1AAIMY3VycmVuY3k9QkFUAAIMZGVzY3Jp\
         cHRpb249AAIaY3JlZGVudGlhbF90eXBlPXNpbmdsZS11c2UAAAYgPpv+Al9jRgVCaR49/\
         AoRrsjQqXGqkwaNfqVka00SJxQ=",
    anonymous_token_order_address: "9094c3f2-b3ae-438f-bd59-92aaad92de5c",
    uphold_token_order_address: "9094c3f2-b3ae-438f-bd59-92aaad92de5c",
    gemini_token_order_address: "60e5e863-8c3d-4341-8b54-23e2695a490c",
    uphold_fee_address: "1b2b466f-5c15-49bf-995e-c91777d3da93",
    gemini_fee_address: "60e5e863-8c3d-4341-8b54-23e2695a490c",
    bitflyer_fee_address: "068e675b-f137-48ed-8068-4ad34ca4f30f",
};

const STAGING: EnvironmentConfig = EnvironmentConfig {
    environment: Environment::Staging,
    payment_service_host: "payment.rewards.staging.patron.software",
    promotion_service_host: "grant.rewards.staging.patron.software",
    publisher_service_host: "publishers.staging.patron.software",
    uphold_api_host: "api-sandbox.uphold.com",
    gemini_api_host: "api.sandbox.gemini.com",
    bitflyer_api_host: "bitflyer.com",
    auto_contribute_sku:
        "AgEJYnJhdmUuY29tAiNicmF2ZSB1c2VyLXdhbGxldC12b3RlIHNrdSB0b2tlbiB2MQACFH\
         NrdT11c2VyLXdhbGxldC12b3RlAAIKcHJpY2U9MC4yNQACDGN1cnJlbmN5PUJBVAACDGRl\
         c2NyaXB0aW9uPQACGmNyZWRlbnRpYWxfdHlwZT1zaW5nbGUtdXNlAAAGIOH4Li+\
         rduCtFOfV8Lfa2o8h4SQjN5CuIwxmeQFjOk4W",
    anonymous_funds_sku:
        "AgEJYnJhdmUuY29tAiFicmF2ZSBhbm9uLWNhcmQtdm90ZSBza3UgdG9rZW4gdjEAAhJza3\
         U9YW5vbi1jYXJkLXZvdGUAAgpwcmljZT0wLjI1AAIMY3VycmVuY3k9QkFUAAIMZGVzY3Jp\
         cHRpb249AAIaY3JlZGVudGlhbF90eXBlPXNpbmdsZS11c2UAAAYgPV/\
         WYY5pXhodMPvsilnrLzNH6MA8nFXwyg0qSWX477M=",
    anonymous_token_order_address: "6654ecb0-6079-4f6c-ba58-791cc890a561",
    uphold_token_order_address: "6654ecb0-6079-4f6c-ba58-791cc890a561",
    gemini_token_order_address: "622b9018-f26a-44bf-9a45-3bf3bf3c95e9",
    uphold_fee_address: "8e7d22c8-f26a-44bf-9a45-3bf3bf3c95e9",
    gemini_fee_address: "622b9018-f26a-44bf-9a45-3bf3bf3c95e9",
    bitflyer_fee_address: "e77cacb4-c49c-4451-bc2d-5072c10d55d3",
};

const PRODUCTION: EnvironmentConfig = EnvironmentConfig {
    environment: Environment::Production,
    payment_service_host: "payment.rewards.patron.software",
    promotion_service_host: "grant.rewards.patron.software",
    publisher_service_host: "publishers.patron.software",
    uphold_api_host: "api.uphold.com",
    gemini_api_host: "api.gemini.com",
    bitflyer_api_host: "bitflyer.com",
    auto_contribute_sku:
        "AgEJYnJhdmUuY29tAiNicmF2ZSB1c2VyLXdhbGxldC12b3RlIHNrdSB0b2tlbiB2MQACFH\
         NrdT11c2VyLXdhbGxldC12b3RlAAIKcHJpY2U9MC4yNQACDGN1cnJlbmN5PUJBVAACDGRl\
         c2NyaXB0aW9uPQACGmNyZWRlbnRpYWxfdHlwZT1zaW5nbGUtdXNlAAAGIOaNAUCBMKm0Ia\
         LqxefhvxOtAKB0OfoiPn0NPVfI602J",
    anonymous_funds_sku:
        "AgEJYnJhdmUuY29tAiFicmF2ZSBhbm9uLWNhcmQtdm90ZSBza3UgdG9rZW4gdjEAAhJza3\
         U9YW5vbi1jYXJkLXZvdGUAAgpwcmljZT0wLjI1AAIMY3VycmVuY3k9QkFUAAIMZGVzY3Jp\
         cHRpb249AAIaY3JlZGVudGlhbF90eXBlPXNpbmdsZS11c2UAAAYgrMZm85YYwnmjPXcegy\
         5pBM5C+ZLfrySZfYiSe13yp8o=",
    anonymous_token_order_address: "86f26f49-9d3b-4f97-9b56-d305ad7a856f",
    uphold_token_order_address: "86f26f49-9d3b-4f97-9b56-d305ad7a856f",
    gemini_token_order_address: "6116adaf-92e6-42fa-bee8-6f749b8eb44e",
    uphold_fee_address: "b01e8c55-5004-4761-9e4b-01ec13e25c92",
    gemini_fee_address: "6116adaf-92e6-42fa-bee8-6f749b8eb44e",
    bitflyer_fee_address: "e77cacb4-c49c-4451-bc2d-5072c10d55d3",
};
