//! Provider descriptors
//!
//! A [`ProviderInfo`] carries all static configuration for one provider:
//! identity, URLs, authentication options, capability flags, metadata the
//! user must supply and branding. String fields may contain `{{.name}}`
//! placeholders until the descriptor is resolved.
//!
//! # Example
//!
//! ```yaml
//! name: salesforce
//! displayName: Salesforce
//! authType: oauth2
//! baseURL: "https://{{.workspace}}.my.salesforce.com"
//! oauth2Opts:
//!   grantType: authorizationCode
//!   authURL: "https://{{.workspace}}.my.salesforce.com/services/oauth2/authorize"
//!   tokenURL: "https://{{.workspace}}.my.salesforce.com/services/oauth2/token"
//!   explicitWorkspaceRequired: true
//! support:
//!   read: true
//!   write: true
//! ```

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{Error, Result};
use crate::substitution::Substitute;
use crate::template::{self, Bindings};
use crate::variables::Workspace;

/// Opaque provider identifier, unique across a registry
pub type ProviderId = String;

/// Opaque module identifier, unique within a provider
pub type ModuleId = String;

/// Module id standing for a provider's default API surface
pub const ROOT_MODULE: &str = "root";

/// How a provider authenticates requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthType {
    /// OAuth 2.0
    Oauth2,
    /// Static API key in a header or query parameter
    ApiKey,
    /// HTTP basic authentication
    Basic,
    /// Provider-specific headers and query parameters
    Custom,
    /// No authentication
    None,
}

/// OAuth 2.0 grant flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GrantType {
    /// Authorization code
    #[default]
    AuthorizationCode,
    /// Authorization code with PKCE
    #[serde(rename = "authorizationCodePKCE")]
    AuthorizationCodePkce,
    /// Client credentials
    ClientCredentials,
    /// Resource owner password
    Password,
}

/// Where an API key is attached to outgoing requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ApiKeyAttachment {
    /// Request header
    Header,
    /// Query parameter
    Query,
}

/// Full static configuration for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderInfo {
    /// Provider id
    pub name: ProviderId,

    /// Human-readable name
    #[serde(default)]
    pub display_name: String,

    /// Authentication kind
    pub auth_type: AuthType,

    /// Base URL for the root module
    #[serde(rename = "baseURL")]
    pub base_url: String,

    /// Module used when none (or an unknown one) is requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_module: Option<ModuleId>,

    /// Per-module API surfaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modules: Option<BTreeMap<ModuleId, ModuleInfo>>,

    /// OAuth 2.0 options, when `authType` is `oauth2`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth2_opts: Option<Oauth2Opts>,

    /// API key options, when `authType` is `apiKey`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_opts: Option<ApiKeyOpts>,

    /// Basic auth options, when `authType` is `basic`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_opts: Option<BasicOpts>,

    /// Custom auth options, when `authType` is `custom`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_opts: Option<CustomAuthOpts>,

    /// Capabilities of the root module
    #[serde(default)]
    pub support: Support,

    /// Inputs collected before and after authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ProviderMetadata>,

    /// Branding assets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Media>,

    /// Endpoint used to verify credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_health_check: Option<AuthHealthCheck>,

    /// Free-form labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// One API surface of a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    /// Base URL of the module
    #[serde(rename = "baseURL")]
    pub base_url: String,

    /// Human-readable name
    #[serde(default)]
    pub display_name: String,

    /// Capabilities of the module
    #[serde(default)]
    pub support: Support,
}

crate::impl_substitute!(ModuleInfo {
    base_url,
    display_name
});

/// Capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Support {
    /// Records can be read
    #[serde(default)]
    pub read: bool,
    /// Records can be written
    #[serde(default)]
    pub write: bool,
    /// Change events can be subscribed to
    #[serde(default)]
    pub subscribe: bool,
    /// Raw requests can be proxied
    #[serde(default)]
    pub proxy: bool,
    /// Bulk write operations
    #[serde(default)]
    pub bulk_write: BulkWriteSupport,
}

/// Bulk write capability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BulkWriteSupport {
    /// Bulk insert
    #[serde(default)]
    pub insert: bool,
    /// Bulk update
    #[serde(default)]
    pub update: bool,
    /// Bulk upsert
    #[serde(default)]
    pub upsert: bool,
    /// Bulk delete
    #[serde(default)]
    pub delete: bool,
}

/// OAuth 2.0 options
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Oauth2Opts {
    /// Grant type
    #[serde(default)]
    pub grant_type: GrantType,

    /// Authorization endpoint (absent for client credentials)
    #[serde(rename = "authURL", default, skip_serializing_if = "Option::is_none")]
    pub auth_url: Option<String>,

    /// Token endpoint
    #[serde(rename = "tokenURL")]
    pub token_url: String,

    /// Extra query parameters for the authorization endpoint
    #[serde(
        rename = "authURLParams",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub auth_url_params: BTreeMap<String, String>,

    /// Scopes must be listed explicitly by the caller
    #[serde(default)]
    pub explicit_scopes_required: bool,

    /// A workspace must be supplied before authenticating
    #[serde(default)]
    pub explicit_workspace_required: bool,

    /// Token audiences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audience: Vec<String>,

    /// Token response fields carrying account metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_metadata_fields: Option<TokenMetadataFields>,
}

crate::impl_substitute!(Oauth2Opts {
    auth_url,
    token_url,
    auth_url_params,
    token_metadata_fields
});

/// Token response field names
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadataFields {
    /// Field holding the consumer reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumer_ref_field: Option<String>,
    /// Field holding the workspace reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_ref_field: Option<String>,
    /// Field holding granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes_field: Option<String>,
}

crate::impl_substitute!(TokenMetadataFields {
    consumer_ref_field,
    workspace_ref_field,
    scopes_field
});

/// API key options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyOpts {
    /// Header or query attachment
    pub attachment_type: ApiKeyAttachment,

    /// Header attachment details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<ApiKeyHeader>,

    /// Query attachment details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<ApiKeyQuery>,

    /// Where users find their key
    #[serde(rename = "docsURL", default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

crate::impl_substitute!(ApiKeyOpts {
    header,
    query,
    docs_url
});

/// API key header attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyHeader {
    /// Header name
    pub name: String,
    /// Prefix placed before the key, e.g. `Bearer `
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_prefix: Option<String>,
}

crate::impl_substitute!(ApiKeyHeader { name, value_prefix });

/// API key query attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKeyQuery {
    /// Query parameter name
    pub name: String,
}

crate::impl_substitute!(ApiKeyQuery { name });

/// Basic auth options
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicOpts {
    /// The API key is sent as the basic-auth username
    #[serde(default)]
    pub api_key_as_basic: bool,

    /// Where users find their credentials
    #[serde(rename = "docsURL", default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

crate::impl_substitute!(BasicOpts { docs_url });

/// Custom auth options
///
/// Header and query value templates are rendered with credentials at request
/// time; as sequences they are left alone when the descriptor is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAuthOpts {
    /// Headers added to every request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<CustomAuthValue>,

    /// Query parameters added to every request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<CustomAuthValue>,

    /// Credentials requested from the user
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<CustomAuthInput>,
}

/// A templated header or query parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAuthValue {
    /// Header or parameter name
    pub name: String,
    /// Value template, e.g. `Token {{.apiKey}}`
    pub value_template: String,
}

/// A credential requested from the user for custom auth
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAuthInput {
    /// Input name, referenced by value templates
    pub name: String,
    /// Label shown to the user
    pub display_name: String,
    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Link to provider documentation
    #[serde(rename = "docsURL", default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

/// Inputs gathered around authentication
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    /// Needed before authentication (they feed placeholders)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<MetadataInput>,

    /// Collected from the provider after authentication
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_authentication: Vec<MetadataInput>,
}

/// One metadata field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataInput {
    /// Placeholder name the value binds
    pub name: String,
    /// Label shown to the user
    #[serde(default)]
    pub display_name: String,
    /// Help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Link to provider documentation
    #[serde(rename = "docsURL", default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    /// Only required for these modules; `None` means every module
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_dependencies: Option<Vec<ModuleId>>,
}

impl MetadataInput {
    /// Whether this input applies to `module`
    pub fn applies_to(&self, module: &str) -> bool {
        match &self.module_dependencies {
            None => true,
            Some(modules) => modules.iter().any(|m| m == module),
        }
    }
}

/// Branding assets, opaque URLs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    /// Light theme assets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regular: Option<MediaAssets>,
    /// Dark theme assets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<MediaAssets>,
}

crate::impl_substitute!(Media { regular, dark_mode });

/// Icon and logo URLs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaAssets {
    /// Icon URL
    #[serde(rename = "iconURL", default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Logo URL
    #[serde(rename = "logoURL", default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

crate::impl_substitute!(MediaAssets { icon_url, logo_url });

/// Endpoint probed to check that credentials work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthHealthCheck {
    /// HTTP method
    #[serde(default = "default_health_check_method")]
    pub method: String,
    /// URL to call
    pub url: String,
    /// Status codes treated as healthy
    #[serde(default = "default_success_status_codes")]
    pub success_status_codes: Vec<u16>,
}

fn default_health_check_method() -> String {
    "GET".to_string()
}

fn default_success_status_codes() -> Vec<u16> {
    vec![200]
}

crate::impl_substitute!(AuthHealthCheck { method, url });

impl Substitute for ProviderInfo {
    fn substitute<B: Bindings + ?Sized>(&mut self, bindings: &B) -> Result<()> {
        self.name.substitute(bindings)?;
        self.display_name.substitute(bindings)?;
        self.base_url.substitute(bindings)?;
        self.default_module.substitute(bindings)?;
        if let Some(modules) = self.modules.as_mut() {
            for module in modules.values_mut() {
                module.substitute(bindings)?;
            }
        }
        self.oauth2_opts.substitute(bindings)?;
        self.api_key_opts.substitute(bindings)?;
        self.basic_opts.substitute(bindings)?;
        self.media.substitute(bindings)?;
        self.auth_health_check.substitute(bindings)?;
        self.labels.substitute(bindings)
    }
}

/// Binds every name to an empty value and remembers which were asked for,
/// so a walk only reports syntax errors
#[derive(Default)]
struct Recorder {
    names: RefCell<BTreeSet<String>>,
}

impl Bindings for Recorder {
    fn binding(&self, name: &str) -> Option<&str> {
        self.names.borrow_mut().insert(name.to_string());
        Some("")
    }
}

impl ProviderInfo {
    /// Check required fields, module references and template syntax.
    ///
    /// Placeholders are allowed; use [`ProviderInfo::validate_resolved`] on
    /// resolved copies.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("provider id is empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(self.invalid("baseURL is empty"));
        }

        match self.auth_type {
            AuthType::Oauth2 if self.oauth2_opts.is_none() => {
                return Err(self.invalid("authType oauth2 requires oauth2Opts"));
            }
            AuthType::ApiKey => {
                let opts = self
                    .api_key_opts
                    .as_ref()
                    .ok_or_else(|| self.invalid("authType apiKey requires apiKeyOpts"))?;
                match opts.attachment_type {
                    ApiKeyAttachment::Header if opts.header.is_none() => {
                        return Err(self.invalid("header attachment requires apiKeyOpts.header"));
                    }
                    ApiKeyAttachment::Query if opts.query.is_none() => {
                        return Err(self.invalid("query attachment requires apiKeyOpts.query"));
                    }
                    _ => {}
                }
            }
            _ => {}
        }

        if let Some(modules) = &self.modules {
            for (id, module) in modules {
                if id.trim().is_empty() {
                    return Err(self.invalid("module id is empty"));
                }
                if module.base_url.trim().is_empty() {
                    return Err(self.invalid(&format!("module '{}' has an empty baseURL", id)));
                }
            }
        }
        if let Some(default) = &self.default_module {
            let known = self
                .modules
                .as_ref()
                .is_some_and(|modules| modules.contains_key(default));
            if !known {
                return Err(self.invalid(&format!(
                    "default module '{}' is not in the module table",
                    default
                )));
            }
        }

        self.variables()
            .map_err(|err| self.invalid(&err.to_string()))?;
        Ok(())
    }

    /// Names of every placeholder used anywhere in the descriptor, sorted
    pub fn variables(&self) -> Result<BTreeSet<String>> {
        let recorder = Recorder::default();
        let mut probe = self.clone();
        probe.substitute(&recorder)?;
        Ok(recorder.names.into_inner())
    }

    /// Check the post-resolution invariants: non-empty id and base URLs.
    pub fn validate_resolved(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("provider id is empty after substitution"));
        }
        if self.base_url.trim().is_empty() {
            return Err(self.invalid("baseURL is empty after substitution"));
        }
        if let Some(modules) = &self.modules {
            if let Some((id, _)) = modules.iter().find(|(_, m)| m.base_url.trim().is_empty()) {
                return Err(self.invalid(&format!(
                    "module '{}' baseURL is empty after substitution",
                    id
                )));
            }
        }
        Ok(())
    }

    fn invalid(&self, message: &str) -> Error {
        Error::InvalidDescriptor {
            provider: self.name.clone(),
            message: message.to_string(),
        }
    }

    /// Whether the caller must supply a workspace before resolving
    pub fn requires_workspace(&self) -> bool {
        if self
            .oauth2_opts
            .as_ref()
            .is_some_and(|opts| opts.explicit_workspace_required)
        {
            return true;
        }
        template::placeholders(&self.base_url)
            .map(|names| names.iter().any(|n| n == Workspace::NAME))
            .unwrap_or(false)
    }

    /// Module ids in sorted order (empty when the provider has no module table)
    pub fn module_ids(&self) -> Vec<&str> {
        self.modules
            .as_ref()
            .map(|modules| modules.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Pre-authentication inputs that apply to `module`
    pub fn metadata_inputs_for(&self, module: &str) -> Vec<&MetadataInput> {
        self.metadata
            .as_ref()
            .map(|metadata| {
                metadata
                    .input
                    .iter()
                    .filter(|input| input.applies_to(module))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The root module synthesized from the top-level fields
    pub fn root_module(&self) -> ModuleInfo {
        ModuleInfo {
            base_url: self.base_url.clone(),
            display_name: self.display_name.clone(),
            support: self.support,
        }
    }
}
