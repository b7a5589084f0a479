//! Process configuration
//!
//! Everything is environment-driven so the container needs no config file;
//! flags exist for local runs.

use clap::Parser;

/// Domain-level overlay substrate service
#[derive(Debug, Parser)]
#[command(name = "meshgate", version, about)]
pub struct Settings {
    /// Address and port to listen on
    #[arg(long, env = "MESHGATE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: String,

    /// Namespace holding the mesh daemon and its objects
    #[arg(long, env = "MESHGATE_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Base network the /24 service blocks are carved from
    #[arg(long, env = "MESHGATE_OVERLAY_SUBNET", default_value = "10.13.0.0/16")]
    pub overlay_subnet: String,

    /// ConfigMap holding the WireGuard interface text
    #[arg(long, env = "MESHGATE_WIREGUARD_CONFIGMAP", default_value = "wg-configmap")]
    pub wireguard_configmap: String,

    /// File key of the WireGuard text inside its ConfigMap
    #[arg(long, env = "MESHGATE_WIREGUARD_FILE_KEY", default_value = "wg0.conf")]
    pub wireguard_file_key: String,

    /// ConfigMap holding the dnsmasq aliasing text
    #[arg(long, env = "MESHGATE_DNSMASQ_CONFIGMAP", default_value = "dnsmasq-configmap")]
    pub dnsmasq_configmap: String,

    /// File key of the dnsmasq text inside its ConfigMap
    #[arg(long, env = "MESHGATE_DNSMASQ_FILE_KEY", default_value = "dnsmasq.conf")]
    pub dnsmasq_file_key: String,

    /// Label selector of the mesh daemon pods
    #[arg(long, env = "MESHGATE_WIREGUARD_POD_LABEL", default_value = "app=wireguard")]
    pub wireguard_pod_label: String,

    /// Secret holding the domain keypair
    #[arg(long, env = "MESHGATE_KEY_SECRET", default_value = "wg-secret-keys")]
    pub key_secret: String,

    /// NGSI-LD context broker endpoint
    #[arg(long, env = "MESHGATE_BROKER_URL", default_value = "http://orion-ld-broker:1026")]
    pub broker_url: String,

    /// Keycloak base URL; token endpoints stay disabled when unset
    #[arg(long, env = "MESHGATE_IDP_URL")]
    pub idp_url: Option<String>,

    /// Keycloak realm
    #[arg(long, env = "MESHGATE_IDP_REALM", default_value = "continuum")]
    pub idp_realm: String,

    /// OAuth client id for machine-to-machine tokens
    #[arg(long, env = "MESHGATE_CLIENT_ID", default_value = "meshgate")]
    pub client_id: String,

    /// OAuth client secret for machine-to-machine tokens
    #[arg(long, env = "MESHGATE_CLIENT_SECRET", default_value = "")]
    pub client_secret: String,

    /// Secret caching the machine-to-machine token
    #[arg(long, env = "MESHGATE_TOKEN_SECRET", default_value = "m2m-token")]
    pub token_secret: String,
}
