//! Manager client, deploy and status tracking against a mock Asterisk


use std::sync::Arc;

use asterisk_dialplan::{
    deploy, AgentState, AgentStatusStore, AgentStatusTracker, AmiConnection, AmiSettings,
    DeploySettings, DialplanError, InMemoryAgentStatusStore, ReloadStatus,
};
use mock_ami::MockAmiServer;

fn settings(port: u16, secret: &str) -> AmiSettings {
    AmiSettings {
        host: "127.0.0.1".into(),
        port,
        username: "dialplan".into(),
        secret: secret.into(),
        timeout_ms: 2000,
    }
}

#[tokio::test]
async fn test_login_and_reload() {
    let server = MockAmiServer::start("dialplan", "s3cret").await;
    let ami = settings(server.port(), "s3cret");

    let (mut mock, connection) = tokio::join!(server.accept(), AmiConnection::connect(&ami));
    let mut connection = connection.unwrap();
    assert!(connection.is_connected());
    assert_eq!(connection.banner(), "Asterisk Call Manager/7.0.3");

    let (output, _) = tokio::join!(connection.reload_dialplan(), async {
        let action = mock
            .read_action()
            .await;
        assert_eq!(action["Action"], "Command");
        assert_eq!(action["Command"], "dialplan reload");
        assert_eq!(action["ActionID"], "2");
        mock.reply_output(&action["ActionID"], &["Dialplan reloaded."])
            .await;
    });
    assert_eq!(output.unwrap(), vec!["Dialplan reloaded.".to_string()]);
}

#[tokio::test]
async fn test_wrong_secret() {
    let server = MockAmiServer::start("dialplan", "s3cret").await;
    let ami = settings(server.port(), "wrong");

    let (_, result) = tokio::join!(server.accept(), AmiConnection::connect(&ami));
    match result {
        Err(DialplanError::AuthenticationFailed { reason }) => {
            assert_eq!(reason, "Authentication failed")
        }
        Err(e) => panic!("Expected AuthenticationFailed, got: {}", e),
        Ok(_) => panic!("Expected error, got success"),
    }
}

#[tokio::test]
async fn test_command_error_keeps_session() {
    let server = MockAmiServer::start("dialplan", "s3cret").await;
    let ami = settings(server.port(), "s3cret");
    let (mut mock, connection) = tokio::join!(server.accept(), AmiConnection::connect(&ami));
    let mut connection = connection.unwrap();

    let (result, _) = tokio::join!(connection.reload_dialplan(), async {
        let action = mock
            .read_action()
            .await;
        mock.reply_error(&action["ActionID"], "Permission denied")
            .await;
    });
    let err = result.unwrap_err();
    assert!(err.is_recoverable());
    assert!(connection.is_connected());
}

#[tokio::test]
async fn test_deploy_installs_then_reloads() {
    let server = MockAmiServer::start("dialplan", "s3cret").await;
    let dir = tempfile::tempdir().unwrap();
    let deploy_settings = DeploySettings {
        output_path: dir
            .path()
            .join("extensions_custom.conf"),
        reload: true,
        ami: settings(server.port(), "s3cret"),
    };

    let (outcome, _) = tokio::join!(deploy::deploy("[internal]\n", &deploy_settings), async {
        let mut mock = server
            .accept()
            .await;
        let command = mock
            .read_action()
            .await;
        assert_eq!(command["Command"], "dialplan reload");
        mock.reply_output(&command["ActionID"], &["Dialplan reloaded."])
            .await;
        let logoff = mock
            .read_action()
            .await;
        assert_eq!(logoff["Action"], "Logoff");
        mock.reply_goodbye(&logoff["ActionID"])
            .await;
    });

    let outcome = outcome.unwrap();
    assert!(matches!(outcome.reload, ReloadStatus::Reloaded(_)));
    assert_eq!(
        std::fs::read_to_string(&deploy_settings.output_path).unwrap(),
        "[internal]\n"
    );
    assert_eq!(
        std::fs::read_dir(dir.path())
            .unwrap()
            .count(),
        1
    );
}

#[tokio::test]
async fn test_reload_failure_keeps_installed_file() {
    // Bind and release a port so nothing listens on it
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        listener
            .local_addr()
            .unwrap()
            .port()
    };
    let dir = tempfile::tempdir().unwrap();
    let deploy_settings = DeploySettings {
        output_path: dir
            .path()
            .join("extensions_custom.conf"),
        reload: true,
        ami: settings(port, "s3cret"),
    };

    let outcome = deploy::deploy("[internal]\n", &deploy_settings)
        .await
        .unwrap();
    assert!(outcome
        .reload
        .is_failed());
    assert!(deploy_settings
        .output_path
        .exists());
}

#[tokio::test]
async fn test_tracker_follows_queue_events() {
    let server = MockAmiServer::start("dialplan", "s3cret").await;
    let ami = settings(server.port(), "s3cret");
    let (mut mock, connection) = tokio::join!(server.accept(), AmiConnection::connect(&ami));
    let mut connection = connection.unwrap();

    let store = Arc::new(InMemoryAgentStatusStore::new());
    let tracker = AgentStatusTracker::new(Arc::clone(&store));

    let (result, _) = tokio::join!(tracker.follow(&mut connection), async {
        mock.send_event(
            "QueueMemberStatus",
            &[("Queue", "sales"), ("Interface", "PJSIP/1000"), ("Status", "1")],
        )
        .await;
        mock.send_event(
            "AgentConnect",
            &[("Queue", "sales"), ("Interface", "PJSIP/1000")],
        )
        .await;
        mock.send_event(
            "QueueMemberPause",
            &[("Queue", "support"), ("Interface", "PJSIP/1001"), ("Paused", "1"), ("PausedReason", "break")],
        )
        .await;
        mock.send_event("Newchannel", &[("Channel", "PJSIP/1002-00000001")])
            .await;
        mock.drop_connection()
            .await;
    });
    result.unwrap();

    let all = store.enumerate();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].extension, "1000");
    assert_eq!(all[0].state, AgentState::OnCall);
    assert_eq!(all[0].queue.as_deref(), Some("sales"));
    assert_eq!(all[1].extension, "1001");
    assert!(all[1].paused);
    assert_eq!(all[1].pause_reason.as_deref(), Some("break"));
}
