#![allow(clippy::unwrap_used)]
// Integration tests for `GatewayClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netwarden_api::{Error, FilterAction, GatewayClient, GatewayConfig, MacFilterEntry, TableWrite, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

fn client_for(server: &MockServer) -> GatewayClient {
    let base_url = Url::parse(&server.uri()).unwrap();
    GatewayClient::new(GatewayConfig {
        base_url,
        username: "admin".into(),
        password: SecretString::from("password"),
        transport: TransportConfig::default(),
    })
    .unwrap()
}

fn ok_body() -> serde_json::Value {
    json!({ "error": "ok" })
}

/// Mount the handshake scaffolding every login walks through: root page,
/// stale-session logout, and the menu probe/activation endpoint.
async fn mount_handshake(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/session/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/session/menu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .mount(server)
        .await;
}

// ── Login handshake ─────────────────────────────────────────────────

#[tokio::test]
async fn login_with_salt_none_sends_plaintext_password() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    // Salt request answered with the literal "none" pair.
    Mock::given(method("POST"))
        .and(path("/api/v1/session/login"))
        .and(body_string_contains("seeksalthash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "ok", "salt": "none", "saltwebui": "none"
        })))
        .mount(&server)
        .await;

    // Credential POST must carry the plaintext password.
    Mock::given(method("POST"))
        .and(path("/api/v1/session/login"))
        .and(body_string_contains("password=password"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "auth=tok123; Path=/")
                .set_body_json(ok_body()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login().await.unwrap();
    assert!(client.is_logged_in());
}

#[tokio::test]
async fn login_with_real_salts_sends_derived_credential() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session/login"))
        .and(body_string_contains("seeksalthash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "ok", "salt": "salt", "saltwebui": "webui"
        })))
        .mount(&server)
        .await;

    // PBKDF2 chain for ("password", "salt", "webui") -- never the plaintext.
    Mock::given(method("POST"))
        .and(path("/api/v1/session/login"))
        .and(body_string_contains("b85cce8d74599bfbfe1577e93afc8303"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "auth=tok123; Path=/")
                .set_body_json(ok_body()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login().await.unwrap();
}

#[tokio::test]
async fn login_fails_on_rejected_credentials() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session/login"))
        .and(body_string_contains("seeksalthash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "ok", "salt": "abc", "saltwebui": "def"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "error", "message": "invalid credentials"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.login().await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
    assert!(!client.is_logged_in());
}

#[tokio::test]
async fn login_fails_fast_without_credentials() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = GatewayClient::new(GatewayConfig {
        base_url,
        username: String::new(),
        password: SecretString::from(""),
        transport: TransportConfig::default(),
    })
    .unwrap();

    let result = client.login().await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
    // No HTTP traffic at all -- wiremock would 404 and fail differently.
}

#[tokio::test]
async fn csrf_token_is_attached_after_login() {
    let server = MockServer::start().await;
    mount_handshake(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "auth=tok123; Path=/")
                .set_body_json(json!({
                    "error": "ok", "salt": "none", "saltwebui": "none"
                })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/host"))
        .and(header("X-CSRF-TOKEN", "tok123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "ok", "data": { "hostTbl": [] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.login().await.unwrap();
    client.fetch_hosts().await.unwrap();
}

// ── Host table ──────────────────────────────────────────────────────

#[tokio::test]
async fn fetch_hosts_parses_table() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/host"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "ok",
            "data": { "hostTbl": [
                {
                    "physaddress": "aa:bb:cc:dd:ee:ff",
                    "ipaddress": "192.168.0.23",
                    "hostname": "phone",
                    "active": "true",
                    "layer1interface": "WIFI.SSID.1"
                },
                {
                    "physaddress": "11:22:33:44:55:66",
                    "ipaddress": "",
                    "hostname": "",
                    "active": "false",
                    "layer1interface": "ETHERNET.2"
                }
            ]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hosts = client.fetch_hosts().await.unwrap();

    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0].physaddress, "aa:bb:cc:dd:ee:ff");
    assert_eq!(hosts[0].hostname, "phone");
    assert!(hosts[0].is_active());
    assert!(!hosts[1].is_active());
}

#[tokio::test]
async fn fetch_hosts_drops_placeholder_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/host"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "ok",
            "data": { "hostTbl": [
                { "physaddress": "", "hostname": "ghost" },
                { "physaddress": "AA:AA:AA:AA:AA:AA", "active": "true" }
            ]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let hosts = client.fetch_hosts().await.unwrap();

    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].physaddress, "AA:AA:AA:AA:AA:AA");
}

// ── Error mapping ───────────────────────────────────────────────────

#[tokio::test]
async fn http_401_maps_to_session_expired() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/host"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.fetch_hosts().await;

    assert!(matches!(result, Err(Error::SessionExpired)));
    assert!(result.unwrap_err().is_auth_expired());
}

#[tokio::test]
async fn business_error_maps_to_protocol() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/macfilter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "error", "message": "CSRF token mismatch"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.mac_filter().await;

    match result {
        Err(Error::Protocol { ref message, .. }) => {
            assert!(message.contains("CSRF"), "unexpected message: {message}");
        }
        other => panic!("expected Protocol error, got: {other:?}"),
    }
}

// ── Filter writes ───────────────────────────────────────────────────

#[tokio::test]
async fn indexed_mac_filter_write_posts_indexed_fields() {
    let server = MockServer::start().await;

    // '[' ']' ':' percent-encode to %5B %5D %3A in the form body.
    Mock::given(method("POST"))
        .and(path("/api/v1/macfilter"))
        .and(body_string_contains("macfilterTbl%5B2%5D%5Bmacaddress%5D=AA%3ABB%3ACC%3ADD%3AEE%3AFF"))
        .and(body_string_contains("allowall=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let write = TableWrite::Indexed {
        index: 2,
        entry: MacFilterEntry {
            macaddress: "AA:BB:CC:DD:EE:FF".into(),
            description: "phone".into(),
            action: FilterAction::Block,
            alwaysblock: "true".into(),
            ..MacFilterEntry::default()
        },
        enable: true,
        allow_all: Some(true),
    };
    client.write_mac_filter(&write).await.unwrap();
}

#[tokio::test]
async fn bulk_mac_filter_write_posts_json_table() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/macfilter"))
        .and(body_string_contains("allowall=false"))
        .and(body_string_contains("macfilterTbl=%5B%7B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let write = TableWrite::Bulk {
        entries: vec![MacFilterEntry {
            macaddress: "AA:BB:CC:DD:EE:FF".into(),
            description: "laptop".into(),
            action: FilterAction::Allow,
            alwaysblock: "false".into(),
            ..MacFilterEntry::default()
        }],
        enable: true,
        allow_all: Some(false),
    };
    client.write_mac_filter(&write).await.unwrap();
}

#[tokio::test]
async fn site_filter_bulk_write_echoes_trusted_table() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/sitefilter"))
        .and(body_string_contains("sitetrustedTbl="))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let write = TableWrite::Bulk {
        entries: Vec::new(),
        enable: false,
        allow_all: None,
    };
    client.write_site_filter(&write, &[]).await.unwrap();
}
