use crate::integration::init_tracing;
use crate::utils::*;
use consult_core::{ClientMessage, ErrorCode, IceCandidate, ServerMessage};
use consult_server::ServerConfig;

#[tokio::test]
async fn test_two_clients_negotiate_over_websocket() {
    init_tracing();
    let addr = spawn_server(ServerConfig::default()).await;
    let room_id = room("apt-123");

    let mut provider = connect_as(addr, Some("provider-1")).await.unwrap();
    let provider_id = match recv(&mut provider).await {
        ServerMessage::Welcome {
            connection_id,
            ice_servers,
        } => {
            assert!(!ice_servers.is_empty());
            connection_id
        }
        other => panic!("expected welcome, got {other:?}"),
    };
    send(
        &mut provider,
        &ClientMessage::JoinRoom {
            room_id: room_id.clone(),
            participant_id: Some("provider-1".to_string()),
        },
    )
    .await;
    assert!(matches!(
        recv(&mut provider).await,
        ServerMessage::RoomJoined { members, .. } if members.is_empty()
    ));

    let mut patient = connect_as(addr, Some("patient-1")).await.unwrap();
    let patient_id = match recv(&mut patient).await {
        ServerMessage::Welcome { connection_id, .. } => connection_id,
        other => panic!("expected welcome, got {other:?}"),
    };
    send(
        &mut patient,
        &ClientMessage::JoinRoom {
            room_id: room_id.clone(),
            participant_id: None,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut patient).await,
        ServerMessage::RoomJoined { members, .. } if members.len() == 1
    ));

    match recv(&mut provider).await {
        ServerMessage::UserJoined { member, .. } => {
            assert_eq!(member.connection_id, patient_id);
            assert_eq!(member.user_id.0, "patient-1");
        }
        other => panic!("expected user-joined, got {other:?}"),
    }

    send(
        &mut provider,
        &ClientMessage::Offer {
            room_id: room_id.clone(),
            sdp: "v=0 offer".to_string(),
            to: Some(patient_id),
        },
    )
    .await;
    send(
        &mut provider,
        &ClientMessage::IceCandidate {
            room_id: room_id.clone(),
            candidate: IceCandidate {
                candidate: "candidate:1 1 udp 1 10.0.0.1 5000 typ host".to_string(),
                sdp_mid: Some("0".to_string()),
                sdp_m_line_index: Some(0),
            },
            to: Some(patient_id),
        },
    )
    .await;

    assert!(matches!(
        recv(&mut patient).await,
        ServerMessage::Offer { from, .. } if from.connection_id == provider_id
    ));
    assert!(matches!(
        recv(&mut patient).await,
        ServerMessage::IceCandidate { .. }
    ));

    send(
        &mut patient,
        &ClientMessage::Answer {
            room_id: room_id.clone(),
            sdp: "v=0 answer".to_string(),
            to: Some(provider_id),
        },
    )
    .await;
    assert!(matches!(
        recv(&mut provider).await,
        ServerMessage::Answer { sdp, .. } if sdp == "v=0 answer"
    ));

    send(
        &mut patient,
        &ClientMessage::EndCall {
            room_id: room_id.clone(),
        },
    )
    .await;
    assert!(matches!(
        recv(&mut provider).await,
        ServerMessage::CallEnded { from, .. } if from.connection_id == patient_id
    ));
    assert!(matches!(
        recv(&mut provider).await,
        ServerMessage::UserLeft { connection_id, .. } if connection_id == patient_id
    ));
}

#[tokio::test]
async fn test_dropped_socket_counts_as_leave() {
    init_tracing();
    let addr = spawn_server(ServerConfig::default()).await;
    let room_id = room("apt-drop");

    let mut provider = connect_as(addr, Some("provider-1")).await.unwrap();
    recv(&mut provider).await;
    send(
        &mut provider,
        &ClientMessage::JoinRoom {
            room_id: room_id.clone(),
            participant_id: None,
        },
    )
    .await;
    recv(&mut provider).await;

    let mut patient = connect_as(addr, Some("patient-1")).await.unwrap();
    recv(&mut patient).await;
    send(
        &mut patient,
        &ClientMessage::JoinRoom {
            room_id: room_id.clone(),
            participant_id: None,
        },
    )
    .await;
    recv(&mut patient).await;
    recv_until(&mut provider, |m| matches!(m, ServerMessage::UserJoined { .. })).await;

    drop(patient);

    assert!(matches!(
        recv(&mut provider).await,
        ServerMessage::UserLeft { .. }
    ));
}

#[tokio::test]
async fn test_garbage_frame_gets_error_and_socket_survives() {
    init_tracing();
    let addr = spawn_server(ServerConfig::default()).await;

    let mut client = connect_as(addr, Some("patient-1")).await.unwrap();
    recv(&mut client).await;

    send_raw(&mut client, "{\"op\":\"teleport\"}").await;
    assert!(matches!(
        recv(&mut client).await,
        ServerMessage::Error {
            code: ErrorCode::InvalidMessage,
            ..
        }
    ));

    send(
        &mut client,
        &ClientMessage::ToggleVideo {
            room_id: room("apt-none"),
            enabled: false,
        },
    )
    .await;
    assert!(matches!(
        recv(&mut client).await,
        ServerMessage::Error {
            code: ErrorCode::NotInRoom,
            ..
        }
    ));
}

#[tokio::test]
async fn test_upgrade_without_identity_is_refused() {
    init_tracing();
    let addr = spawn_server(ServerConfig::default()).await;

    assert!(connect_as(addr, None).await.is_err());
}
