/// Interleaves planar `f32` audio into S16 samples while applying a gain ramp.
///
/// Gain moves linearly from `gain_from` on the first frame to `gain_to` on the
/// last, so a volume change between buffers does not produce a step.
pub fn interleave_to_s16(planes: &[Vec<f32>], gain_from: f32, gain_to: f32) -> Vec<i16> {
    let num_channels = planes.len();
    if num_channels == 0 {
        return Vec::new();
    }
    let num_frames = planes.iter().map(Vec::len).min().unwrap_or(0);
    if num_frames == 0 {
        return Vec::new();
    }

    let step = if num_frames > 1 {
        (gain_to - gain_from) / (num_frames - 1) as f32
    } else {
        0.0
    };

    let mut s16_vec = vec![0i16; num_frames * num_channels];
    for frame in 0..num_frames {
        let gain = if num_frames > 1 { gain_from + step * frame as f32 } else { gain_to };
        for (ch, plane) in planes.iter().enumerate() {
            s16_vec[frame * num_channels + ch] = to_s16(plane[frame] * gain);
        }
    }
    s16_vec
}

fn to_s16(sample: f32) -> i16 {
    (sample * 32767.0).clamp(-32768.0, 32767.0) as i16
}
