#![no_main]

use libfuzzer_sys::fuzz_target;
use luminex::audio::SimulatedMediaElement;
use luminex::controller::{PlaybackController, PlaybackState};
use luminex::media::PlayRejection;
use luminex::model::{MediaItem, MediaKind};
use luminex::queue::QueueState;

fuzz_target!(|data: &[u8]| {
    let len = data.first().map_or(1, |byte| usize::from(*byte % 8));
    let items = (0..len)
        .map(|idx| MediaItem::new(&format!("clip_{idx}.mp4"), &format!("clip {idx}"), ""))
        .collect();
    let element = SimulatedMediaElement::new(Some(5.0));
    let mut player =
        PlaybackController::new(MediaKind::Video, QueueState::seeded(items, 7), element.clone(), 1.0);

    for byte in data.iter().skip(1) {
        match byte % 16 {
            0 => player.play(),
            1 => player.pause(),
            2 => player.toggle_play(),
            3 => player.next(),
            4 => player.previous(),
            5 => player.toggle_shuffle(),
            6 => player.toggle_repeat(),
            7 => {
                let _ = player.play_index(usize::from(byte >> 4));
            }
            8 => player.seek_fraction(f64::from(*byte) / 255.0),
            9 => player.seek_relative(f64::from(*byte as i8)),
            10 => player.step_volume(f32::from(*byte as i8) / 100.0),
            11 => player.cycle_speed(),
            12 => element.elapse(f64::from(byte >> 4)),
            13 => element.reject_next_play(PlayRejection::NotAllowed(String::from("fuzz"))),
            14 => player.stop(),
            _ => player.pump(),
        }

        assert!((0.0..=1.0).contains(&player.binding().volume()));
        if player.state() == PlaybackState::Idle {
            assert_eq!(player.current_index(), None);
        } else {
            assert!(player.current_index().is_some_and(|idx| idx < len));
        }
    }
});
