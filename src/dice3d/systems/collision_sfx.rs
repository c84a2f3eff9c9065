//! Plays a click for every audible die impact.

use bevy::audio::{AudioPlayer, AudioSource, PlaybackSettings, Volume};
use bevy::log::warn;
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::dice3d::types::{AudioSettings, DiceRollInputs, DiceSettings};

/// Amplitudes below this are not worth a voice.
const AUDIBLE_FLOOR: f32 = 0.01;

const SAMPLE_RATE: u32 = 22_050;
const CLICK_SECONDS: f32 = 0.06;

/// One impact reported by the roller this frame.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct DieImpact {
    pub speed: f32,
    pub position: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedSound {
    pub amplitude: f32,
    pub position: Vec3,
}

#[derive(Resource, Clone)]
pub struct DiceImpactSfx {
    pub clip: Handle<AudioSource>,
}

/// Playback amplitude for an impact; 0 means silent.
pub fn impact_amplitude(speed: f32, volume: f32, settings: &AudioSettings) -> f32 {
    if !(speed >= settings.min_impact_speed) || settings.reference_impact_speed <= 0.0 {
        return 0.0;
    }
    (speed / settings.reference_impact_speed).clamp(0.0, 1.0) * volume.clamp(0.0, 1.0)
}

/// Loudest audible impacts of one frame, at most `max_sounds_per_frame`.
pub fn plan_impact_sounds(
    impacts: &[DieImpact],
    volume: f32,
    settings: &AudioSettings,
) -> Vec<PlannedSound> {
    let mut sounds: Vec<PlannedSound> = impacts
        .iter()
        .map(|impact| PlannedSound {
            amplitude: impact_amplitude(impact.speed, volume, settings),
            position: impact.position,
        })
        .filter(|sound| sound.amplitude >= AUDIBLE_FLOOR)
        .collect();
    sounds.sort_by(|a, b| b.amplitude.total_cmp(&a.amplitude));
    sounds.truncate(settings.max_sounds_per_frame);
    sounds
}

/// Short decaying noise burst, encoded as 16-bit mono WAV.
pub fn synthesize_click_wav() -> Result<Vec<u8>, hound::Error> {
    let count = (SAMPLE_RATE as f32 * CLICK_SECONDS) as u32;
    let mut rng = StdRng::seed_from_u64(0x0D1CE);

    let mut output = Vec::new();
    let cursor = std::io::Cursor::new(&mut output);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::new(cursor, spec)?;

    for i in 0..count {
        let t = i as f32 / SAMPLE_RATE as f32;
        let envelope = (-t * 90.0).exp();
        let tone = (t * 2_400.0 * std::f32::consts::TAU).sin() * 0.4;
        let noise: f32 = rng.gen_range(-1.0..1.0);
        let sample = ((noise * 0.6 + tone) * envelope * 0.9).clamp(-1.0, 1.0);
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;

    Ok(output)
}

pub fn init_impact_sound(mut commands: Commands, mut sources: ResMut<Assets<AudioSource>>) {
    match synthesize_click_wav() {
        Ok(bytes) => {
            let clip = sources.add(AudioSource {
                bytes: bytes.into(),
            });
            commands.insert_resource(DiceImpactSfx { clip });
        }
        Err(e) => warn!("Failed to encode dice impact sound: {}", e),
    }
}

pub fn play_dice_impact_sfx(
    mut commands: Commands,
    sfx: Option<Res<DiceImpactSfx>>,
    settings: Res<DiceSettings>,
    inputs: Res<DiceRollInputs>,
    mut impacts: MessageReader<DieImpact>,
) {
    let frame: Vec<DieImpact> = impacts.read().copied().collect();
    let Some(sfx) = sfx else {
        return;
    };

    for sound in plan_impact_sounds(&frame, inputs.volume(), &settings.audio) {
        commands.spawn((
            AudioPlayer(sfx.clip.clone()),
            PlaybackSettings::DESPAWN.with_volume(Volume::Linear(sound.amplitude)),
            Transform::from_translation(sound.position),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impact(speed: f32) -> DieImpact {
        DieImpact {
            speed,
            position: Vec3::ZERO,
        }
    }

    #[test]
    fn test_amplitude_scales_with_speed_and_volume() {
        let settings = AudioSettings::default();
        assert_eq!(impact_amplitude(5.0, 1.0, &settings), 1.0);
        assert_eq!(impact_amplitude(10.0, 0.5, &settings), 0.5);
        assert!((impact_amplitude(2.5, 1.0, &settings) - 0.5).abs() < 1e-6);
        assert_eq!(impact_amplitude(0.2, 1.0, &settings), 0.0);
        assert_eq!(impact_amplitude(f32::NAN, 1.0, &settings), 0.0);
    }

    #[test]
    fn test_zero_volume_plays_nothing() {
        let settings = AudioSettings::default();
        let impacts = [impact(8.0), impact(3.0)];
        assert!(plan_impact_sounds(&impacts, 0.0, &settings).is_empty());
    }

    #[test]
    fn test_only_loudest_impacts_play() {
        let settings = AudioSettings::default();
        let impacts: Vec<DieImpact> = [1.0, 6.0, 0.1, 2.0, 4.0, 3.0]
            .into_iter()
            .map(impact)
            .collect();
        let plan = plan_impact_sounds(&impacts, 1.0, &settings);
        assert_eq!(plan.len(), settings.max_sounds_per_frame);
        assert_eq!(plan[0].amplitude, 1.0);
        assert!(plan.windows(2).all(|w| w[0].amplitude >= w[1].amplitude));
    }

    #[test]
    fn test_click_is_a_wav() {
        let wav = synthesize_click_wav().unwrap();
        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), (SAMPLE_RATE as f32 * CLICK_SECONDS) as u32);
    }
}
