use crate::integration::init_tracing;
use crate::utils::*;
use consult_core::{IceCandidate, ServerMessage, SignalEnvelope, SignalPayload};

fn candidate(n: usize) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:{n} 1 udp 2122260223 10.0.0.{n} 5000{n} typ host"),
        sdp_mid: Some("0".to_string()),
        sdp_m_line_index: Some(0),
    }
}

#[tokio::test]
async fn test_signals_arrive_in_send_order() {
    init_tracing();
    let (registry, signaling) = create_test_registry(2);
    let room_id = room("apt-fifo");

    let (provider, _) = join_new(&registry, &room_id, "provider").await;
    let (patient, _) = join_new(&registry, &room_id, "patient").await;

    registry
        .relay(SignalEnvelope {
            room_id: room_id.clone(),
            from: provider,
            to: Some(patient),
            payload: SignalPayload::Offer {
                sdp: "v=0 offer".to_string(),
            },
        })
        .unwrap();
    for n in 0..20 {
        registry
            .relay(SignalEnvelope {
                room_id: room_id.clone(),
                from: provider,
                to: Some(patient),
                payload: SignalPayload::IceCandidate(candidate(n)),
            })
            .unwrap();
    }
    settle(&registry, &room_id).await;

    let frames = signaling.messages_for(&patient).await;
    let relayed: Vec<&ServerMessage> = frames
        .iter()
        .filter(|m| {
            matches!(
                m,
                ServerMessage::Offer { .. } | ServerMessage::IceCandidate { .. }
            )
        })
        .collect();

    assert_eq!(relayed.len(), 21);
    assert!(matches!(relayed[0], ServerMessage::Offer { .. }));
    for (n, msg) in relayed[1..].iter().enumerate() {
        match msg {
            ServerMessage::IceCandidate { candidate: c, .. } => assert_eq!(c, &candidate(n)),
            other => panic!("unexpected frame {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_nothing_delivered_after_leave() {
    init_tracing();
    let (registry, signaling) = create_test_registry(2);
    let room_id = room("apt-cancel");

    let (provider, _) = join_new(&registry, &room_id, "provider").await;
    let (patient, _) = join_new(&registry, &room_id, "patient").await;

    registry.leave(&room_id, patient);
    registry
        .relay(SignalEnvelope {
            room_id: room_id.clone(),
            from: provider,
            to: Some(patient),
            payload: SignalPayload::IceCandidate(candidate(1)),
        })
        .unwrap();
    settle(&registry, &room_id).await;

    let frames = signaling.messages_for(&patient).await;
    assert!(
        !frames
            .iter()
            .any(|m| matches!(m, ServerMessage::IceCandidate { .. })),
        "left member received a candidate"
    );
    assert!(matches!(
        signaling.messages_for(&provider).await.last(),
        Some(ServerMessage::DeliveryFailed { .. })
    ));
}
