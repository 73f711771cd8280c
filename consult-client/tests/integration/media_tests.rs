use crate::integration::init_tracing;
use crate::utils::*;
use consult_client::rtc::Availability;
use consult_client::{
    CallCommand, CallError, CallEvent, CallState, EndReason, MediaConstraints, MediaError,
    MediaKind, SessionConfig, SessionEvent,
};
use consult_core::{ClientMessage, RoomId, ServerMessage};

async fn connected(user: &str) -> Harness {
    let mut a = Harness::joined(user, 1, &[]).await;
    let mut b = Harness::joined("patient", 2, std::slice::from_ref(&a.me)).await;
    let b_me = b.me.clone();
    a.deliver(user_joined(&b_me)).await;
    exchange(&mut a, &mut b).await;
    assert_eq!(a.session.state(), CallState::Connected);
    a.sent();
    a.events();
    a
}

#[tokio::test]
async fn test_camera_denied_falls_back_to_audio_only() {
    init_tracing();
    let devices = FakeDevices::new().with(MediaKind::Camera, Availability::Denied);
    let mut a = Harness::new(member("provider", 1), devices, FakeConnector::new("provider"));

    a.session.start().await.unwrap();

    assert_eq!(a.session.state(), CallState::WaitingForPeer);
    assert!(a.session.local_stream().unwrap().is_audio_only());
    assert!(!a.session.video_enabled());
    assert_eq!(
        *a.devices.requests.lock().unwrap(),
        vec![MediaConstraints::AUDIO_VIDEO, MediaConstraints::AUDIO_ONLY]
    );
    // The microphone grabbed by the failed first attempt was released.
    let microphones = a.devices.sinks(MediaKind::Microphone);
    assert_eq!(microphones.len(), 2);
    assert_eq!(microphones[0].stop_count(), 1);
    assert_eq!(microphones[1].stop_count(), 0);

    assert!(a.events().contains(&CallEvent::LocalMediaReady { audio_only: true }));
    assert!(matches!(&a.sent()[..], [ClientMessage::JoinRoom { .. }]));
}

#[tokio::test]
async fn test_media_failure_without_fallback_ends_call() {
    init_tracing();
    let devices = FakeDevices::new().with(MediaKind::Camera, Availability::Missing);
    let mut config = SessionConfig::new(room_id());
    config.audio_only_fallback = false;
    let mut a = Harness::with_config(
        member("provider", 1),
        devices,
        FakeConnector::new("provider"),
        config,
    );

    let err = a.session.start().await.unwrap_err();

    assert!(matches!(
        err,
        CallError::Media(MediaError::DeviceNotFound(MediaKind::Camera))
    ));
    assert_eq!(a.session.state(), CallState::Ended);
    assert_eq!(a.session.end_reason(), Some(EndReason::MediaUnavailable));
    assert!(a.sent().is_empty(), "never joins the room without media");
    assert!(a.events().iter().any(|evt| matches!(evt, CallEvent::Status(_))));
}

#[tokio::test]
async fn test_microphone_denied_is_fatal_even_with_fallback() {
    init_tracing();
    let devices = FakeDevices::new().with(MediaKind::Microphone, Availability::Denied);
    let mut a = Harness::new(member("provider", 1), devices, FakeConnector::new("provider"));

    assert!(a.session.start().await.is_err());
    assert_eq!(a.session.end_reason(), Some(EndReason::MediaUnavailable));
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    init_tracing();
    let mut a = Harness::joined("provider", 1, &[]).await;

    let err = a.session.start().await.unwrap_err();
    assert!(matches!(err, CallError::InvalidState { .. }));
    assert_eq!(a.session.state(), CallState::WaitingForPeer);
}

#[tokio::test]
async fn test_toggle_video_does_not_renegotiate() {
    init_tracing();
    let mut a = connected("provider").await;
    let offers_before = a.connector.log().offers_created;

    a.session
        .dispatch(SessionEvent::Command(CallCommand::ToggleVideo(false)))
        .await;

    let camera = a.devices.sinks(MediaKind::Camera);
    assert!(!camera[0].enabled.load(std::sync::atomic::Ordering::SeqCst));
    assert!(!a.session.video_enabled());
    assert_eq!(a.session.state(), CallState::Connected);
    assert_eq!(a.connector.log().offers_created, offers_before);
    assert_eq!(a.connector.connect_count(), 1);
    assert!(matches!(
        &a.sent()[..],
        [ClientMessage::ToggleVideo { enabled: false, .. }]
    ));
    assert!(a.events().contains(&CallEvent::LocalVideoToggled(false)));
}

#[tokio::test]
async fn test_toggle_audio_keeps_track() {
    init_tracing();
    let mut a = connected("provider").await;
    let microphone = a.devices.last_track(MediaKind::Microphone).unwrap();

    a.session.set_audio_enabled(false).unwrap();
    a.session.set_audio_enabled(true).unwrap();

    let current = a.session.local_stream().unwrap().audio.clone().unwrap();
    assert!(current.same_track(&microphone));
    assert!(current.is_enabled());
    assert_eq!(a.sent().len(), 2);
}

#[tokio::test]
async fn test_toggle_video_on_audio_only_call_fails() {
    init_tracing();
    let devices = FakeDevices::new().with(MediaKind::Camera, Availability::Missing);
    let mut a = Harness::new(member("provider", 1), devices, FakeConnector::new("provider"));
    a.session.start().await.unwrap();
    a.events();

    a.session
        .dispatch(SessionEvent::Command(CallCommand::ToggleVideo(true)))
        .await;

    assert_eq!(a.session.state(), CallState::WaitingForPeer);
    assert!(a.events().iter().any(|evt| matches!(evt, CallEvent::Status(_))));
}

#[tokio::test]
async fn test_remote_toggles_are_surfaced() {
    init_tracing();
    let mut a = Harness::joined("provider", 1, &[]).await;
    let b = member("patient", 2);
    a.deliver(user_joined(&b)).await;
    a.events();

    a.deliver(relayed(&b, ClientMessage::ToggleVideo { room_id: room_id(), enabled: false }).unwrap())
        .await;
    a.deliver(relayed(&b, ClientMessage::ToggleAudio { room_id: room_id(), enabled: false }).unwrap())
        .await;
    a.deliver(relayed(&b, ClientMessage::ScreenShareStarted { room_id: room_id() }).unwrap())
        .await;

    assert_eq!(
        a.events(),
        vec![
            CallEvent::RemoteVideoToggled(false),
            CallEvent::RemoteAudioToggled(false),
            CallEvent::RemoteScreenShare(true),
        ]
    );
}

#[tokio::test]
async fn test_toggles_for_another_room_are_ignored() {
    init_tracing();
    let mut a = Harness::joined("provider", 1, &[]).await;
    let b = member("patient", 2);
    a.deliver(user_joined(&b)).await;
    a.events();
    let other_room: RoomId = "apt-other".parse().unwrap();

    a.deliver(ServerMessage::UserToggleVideo {
        room_id: other_room.clone(),
        from: b.clone(),
        enabled: false,
    })
    .await;
    a.deliver(ServerMessage::UserToggleAudio {
        room_id: other_room.clone(),
        from: b.clone(),
        enabled: false,
    })
    .await;
    a.deliver(ServerMessage::UserScreenShare {
        room_id: other_room,
        from: b,
        sharing: true,
    })
    .await;

    assert!(a.events().is_empty());
}

#[tokio::test]
async fn test_screen_share_replaces_only_video() {
    init_tracing();
    let mut a = connected("provider").await;
    let microphone = a.devices.last_track(MediaKind::Microphone).unwrap();
    let camera = a.devices.last_track(MediaKind::Camera).unwrap();

    a.session.start_screen_share().await.unwrap();

    let screen = a.devices.last_track(MediaKind::Screen).unwrap();
    assert!(a.session.is_screen_sharing());
    assert!(a.session.screen_track().unwrap().same_track(&screen));
    assert_eq!(
        a.connector.log().replaced_video,
        vec![Some(screen.id().to_string())]
    );
    let audio = a.session.local_stream().unwrap().audio.clone().unwrap();
    assert!(audio.same_track(&microphone));
    assert!(matches!(&a.sent()[..], [ClientMessage::ScreenShareStarted { .. }]));

    a.session.stop_screen_share().await.unwrap();

    assert!(!a.session.is_screen_sharing());
    assert!(screen.is_ended());
    assert!(!camera.is_ended());
    assert_eq!(
        a.connector.log().replaced_video,
        vec![Some(screen.id().to_string()), Some(camera.id().to_string())]
    );
    let audio = a.session.local_stream().unwrap().audio.clone().unwrap();
    assert!(audio.same_track(&microphone));
    assert_eq!(a.connector.log().offers_created, 1);
    assert_eq!(a.session.state(), CallState::Connected);
    assert!(matches!(&a.sent()[..], [ClientMessage::ScreenShareStopped { .. }]));
}

#[tokio::test]
async fn test_screen_capture_ending_reverts_to_camera() {
    init_tracing();
    let mut a = connected("provider").await;
    let camera = a.devices.last_track(MediaKind::Camera).unwrap();
    a.session.start_screen_share().await.unwrap();
    a.sent();

    // Spurious notification while the capture is still live.
    a.session.dispatch(SessionEvent::ScreenTrackEnded).await;
    assert!(a.session.is_screen_sharing());

    let screen = a.session.screen_track().unwrap().clone();
    screen.stop();
    a.session.dispatch(SessionEvent::ScreenTrackEnded).await;

    assert!(!a.session.is_screen_sharing());
    assert!(a.session.screen_track().is_none());
    assert_eq!(
        a.connector.log().replaced_video.last(),
        Some(&Some(camera.id().to_string()))
    );
    assert_eq!(a.devices.sinks(MediaKind::Screen)[0].stop_count(), 1);
    assert!(matches!(&a.sent()[..], [ClientMessage::ScreenShareStopped { .. }]));
}

#[tokio::test]
async fn test_screen_share_needs_a_peer() {
    init_tracing();
    let mut a = Harness::joined("provider", 1, &[]).await;

    let err = a.session.start_screen_share().await.unwrap_err();

    assert!(matches!(err, CallError::InvalidState { .. }));
    assert!(a.devices.sinks(MediaKind::Screen).is_empty());
}

#[tokio::test]
async fn test_screen_share_denied_leaves_call_untouched() {
    init_tracing();
    let devices = FakeDevices::new().with(MediaKind::Screen, Availability::Denied);
    let mut c = Harness::new(member("clinician", 1), devices, FakeConnector::new("clinician"));
    c.session.start().await.unwrap();
    let me = c.me.clone();
    c.deliver(welcome(&me)).await;
    c.deliver(room_joined(&me, &[])).await;
    c.deliver(user_joined(&member("patient", 2))).await;
    c.sent();

    let err = c.session.start_screen_share().await.unwrap_err();

    assert!(matches!(
        err,
        CallError::Media(MediaError::PermissionDenied(MediaKind::Screen))
    ));
    assert!(!c.session.is_screen_sharing());
    assert!(c.connector.log().replaced_video.is_empty());
    assert!(c.sent().is_empty());
    assert_eq!(c.session.state(), CallState::Negotiating);
}

#[tokio::test]
async fn test_end_while_sharing_releases_screen() {
    init_tracing();
    let mut a = connected("provider").await;
    a.session.start_screen_share().await.unwrap();

    a.session.hang_up().await;

    assert_eq!(a.devices.sinks(MediaKind::Screen)[0].stop_count(), 1);
    assert_eq!(a.devices.sinks(MediaKind::Camera)[0].stop_count(), 1);
    assert!(!a.session.is_screen_sharing());
}
