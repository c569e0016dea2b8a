// ABOUTME: Integration tests for relayed file reads and writes.
// ABOUTME: Covers byte fidelity, error mapping and teardown after transfer failures.

mod support;

use bastion_relay::error::ErrorKind;
use bastion_relay::relay::run_relayed;
use bastion_relay::transfer::{ReadFile, WriteFile};
use bastion_relay::tunnel::{Endpoint, TunnelResource, TunnelRoute};
use support::mock_hop::{MockHop, Point};

fn route() -> TunnelRoute {
    TunnelRoute::new(
        Endpoint::new("bastion.example.com", "jump"),
        Endpoint::new("10.0.0.5", "app"),
    )
}

fn bastion_key() -> String {
    support::key_fixture("id_ed25519")
}

fn target_key() -> String {
    support::key_fixture("id_ecdsa")
}

async fn write_then_read(hop: &MockHop, path: &str, content: Vec<u8>) -> Vec<u8> {
    run_relayed(hop, &route(), &bastion_key(), &target_key(), WriteFile::new(path, content))
        .await
        .unwrap();
    run_relayed(hop, &route(), &bastion_key(), &target_key(), ReadFile::new(path))
        .await
        .unwrap()
}

mod fidelity {
    use super::*;

    #[tokio::test]
    async fn empty_file_reads_back_empty() {
        let hop = MockHop::new();
        assert_eq!(write_then_read(&hop, "/tmp/empty", Vec::new()).await, Vec::<u8>::new());
    }

    #[tokio::test]
    async fn single_byte_survives() {
        let hop = MockHop::new();
        assert_eq!(write_then_read(&hop, "/tmp/one", vec![0x7f]).await, vec![0x7f]);
    }

    #[tokio::test]
    async fn binary_content_with_nulls_and_high_bytes_survives() {
        let hop = MockHop::new();
        let content: Vec<u8> = (0..8192u32).map(|i| (i * 31 % 256) as u8).collect();
        assert!(content.contains(&0) && content.contains(&0xff));
        assert_eq!(write_then_read(&hop, "/srv/blob.bin", content.clone()).await, content);
    }

    #[tokio::test]
    async fn line_endings_are_not_translated() {
        let hop = MockHop::new();
        let content = b"a\r\nb\nc\r".to_vec();
        assert_eq!(write_then_read(&hop, "/etc/app.conf", content.clone()).await, content);
    }

    #[tokio::test]
    async fn each_operation_opens_and_closes_its_own_tunnel() {
        let hop = MockHop::new();
        write_then_read(&hop, "/tmp/x", b"x".to_vec()).await;
        assert_eq!(hop.opened(), 6);
        assert_eq!(hop.closed().len(), 6);
        assert_eq!(hop.live(), 0);
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn missing_remote_file_is_a_read_failure() {
        let hop = MockHop::new();
        let err = run_relayed(&hop, &route(), &bastion_key(), &target_key(), ReadFile::new("/nope"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteReadFailed);
        assert_eq!(hop.live(), 0);
    }

    #[tokio::test]
    async fn write_failure_after_ready_still_tears_down_once() {
        let hop = MockHop::new().fail_at(Point::Write);
        let err = run_relayed(
            &hop,
            &route(),
            &bastion_key(),
            &target_key(),
            WriteFile::new("/tmp/x", b"data".to_vec()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteWriteFailed);
        assert_eq!(
            hop.closed(),
            vec![TunnelResource::Target, TunnelResource::Channel, TunnelResource::Bastion]
        );
        assert_eq!(hop.live(), 0);
    }

    #[tokio::test]
    async fn stage_failures_surface_as_their_stage() {
        for (point, kind) in [
            (Point::BastionAuth, ErrorKind::BastionAuthFailed),
            (Point::ChannelOpen, ErrorKind::ChannelOpenFailed),
            (Point::TargetAuth, ErrorKind::TargetAuthFailed),
        ] {
            let hop = MockHop::new().with_file("/etc/hostname", "h1").fail_at(point);
            let err = run_relayed(
                &hop,
                &route(),
                &bastion_key(),
                &target_key(),
                ReadFile::new("/etc/hostname"),
            )
            .await
            .unwrap_err();
            assert_eq!(err.kind(), kind, "failing at {:?}", point);
            assert_eq!(hop.live(), 0);
        }
    }

    #[tokio::test]
    async fn bad_key_fails_before_any_connection() {
        let hop = MockHop::new();
        let err = run_relayed(&hop, &route(), "not a key", &target_key(), ReadFile::new("/x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidKeyFormat);

        let err = run_relayed(&hop, &route(), &bastion_key(), "   ", ReadFile::new("/x"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyCredentialInput);
        assert_eq!(hop.opened(), 0);
    }

    #[tokio::test]
    async fn empty_remote_path_is_rejected() {
        let hop = MockHop::new();
        let err = run_relayed(&hop, &route(), &bastion_key(), &target_key(), ReadFile::new(""))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert_eq!(hop.live(), 0);
    }
}
