//! Status client behaviour against a mock updater endpoint.

mod common;

use common::{closed_port_url, Workspace, STATUS_PATH, TOKEN};
use plexup_core::status::{StatusClient, TOKEN_HEADER};
use plexup_core::update_info::UpdateStatus;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> StatusClient {
    let workspace = Workspace::new();
    StatusClient::new(&workspace.settings(server)).unwrap()
}

#[tokio::test]
async fn sends_token_and_reports_available_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .and(header(TOKEN_HEADER, TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<MediaContainer size="1" downloadURL="https://downloads.plex.tv/pms_1.41.deb"/>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let status = client_for(&server).await.check().await;
    assert_eq!(
        status,
        UpdateStatus::Available {
            download_url: "https://downloads.plex.tv/pms_1.41.deb".into()
        }
    );
}

#[tokio::test]
async fn repeated_checks_without_update_are_stable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<Update size="0"/>"#))
        .expect(2)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert_eq!(client.check().await, UpdateStatus::NotAvailable);
    assert_eq!(client.check().await, UpdateStatus::NotAvailable);
}

#[tokio::test]
async fn http_error_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"<Update size="0"/>"#))
        .mount(&server)
        .await;

    let status = client_for(&server).await.check().await;
    assert!(matches!(status, UpdateStatus::Unknown { .. }), "{status:?}");
}

#[tokio::test]
async fn missing_size_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<Update downloadURL="http://host/plex.deb"/>"#),
        )
        .mount(&server)
        .await;

    let status = client_for(&server).await.check().await;
    assert!(matches!(status, UpdateStatus::Unknown { .. }), "{status:?}");
}

#[tokio::test]
async fn unreachable_server_is_unknown() {
    let workspace = Workspace::new();
    let client = StatusClient::new(&workspace.settings_for_base(&closed_port_url())).unwrap();

    let status = client.check().await;
    assert!(matches!(status, UpdateStatus::Unknown { .. }), "{status:?}");
}

#[tokio::test]
async fn redirects_are_not_followed_with_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/elsewhere/status", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"<Update size="0"/>"#))
        .expect(0)
        .mount(&server)
        .await;

    let status = client_for(&server).await.check().await;
    assert!(matches!(status, UpdateStatus::Unknown { .. }), "{status:?}");
}
