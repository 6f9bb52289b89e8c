//! Minimal RIFF/WAVE helpers for 16-bit PCM clips.

use std::time::Duration;

const HEADER_LEN: usize = 44;

/// Encode f32 PCM (mono) to 16-bit WAV bytes.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut buf = Vec::with_capacity(HEADER_LEN + data_len as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_len).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&1u16.to_le_bytes()); // mono
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    buf.extend_from_slice(&2u16.to_le_bytes()); // block align
    buf.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_len.to_le_bytes());
    for &s in samples {
        let i = (s.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        buf.extend_from_slice(&i.to_le_bytes());
    }
    buf
}

/// A WAV clip of `duration` silence.
pub fn silence(duration: Duration, sample_rate: u32) -> Vec<u8> {
    let samples = (duration.as_secs_f64() * sample_rate as f64).round() as usize;
    encode_wav(&vec![0.0; samples], sample_rate)
}

/// Playback duration read from a WAV header, or `None` if `bytes` is not a
/// well-formed RIFF/WAVE container.
pub fn wav_duration(bytes: &[u8]) -> Option<Duration> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }

    let mut byte_rate = None;
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().ok()?) as usize;
        let body = pos + 8;

        match id {
            b"fmt " => {
                let rate = bytes.get(body + 8..body + 12)?;
                byte_rate = Some(u32::from_le_bytes(rate.try_into().ok()?));
            }
            b"data" => {
                let rate = byte_rate.filter(|r| *r > 0)?;
                // Streamed recorders may leave the size unset
                let len = size.min(bytes.len() - body);
                return Some(Duration::from_secs_f64(len as f64 / rate as f64));
            }
            _ => {}
        }
        // Chunks are word aligned
        pos = body + size + (size & 1);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_header() {
        let wav = encode_wav(&[0.0, 0.5, -0.5, 1.0], 16000);
        assert_eq!(wav.len(), 44 + 8);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 8);
    }

    #[test]
    fn test_samples_clamped() {
        let wav = encode_wav(&[2.0, -2.0], 8000);
        assert_eq!(i16::from_le_bytes([wav[44], wav[45]]), 32767);
        assert_eq!(i16::from_le_bytes([wav[46], wav[47]]), -32767);
    }

    #[test]
    fn test_duration_of_encoded_clip() {
        let wav = silence(Duration::from_millis(1500), 16000);
        let d = wav_duration(&wav).unwrap();
        assert!((d.as_secs_f64() - 1.5).abs() < 0.001);
    }

    #[test]
    fn test_duration_skips_unknown_chunks() {
        let mut wav = encode_wav(&vec![0.0; 16000], 16000);
        // Splice a LIST chunk with an odd size between fmt and data
        let list = [b"LIST".as_slice(), &3u32.to_le_bytes(), b"abc\0"].concat();
        wav.splice(36..36, list);
        let d = wav_duration(&wav).unwrap();
        assert!((d.as_secs_f64() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_not_wav() {
        assert!(wav_duration(b"OggS\0\0\0\0\0\0\0\0\0\0").is_none());
        assert!(wav_duration(&[]).is_none());
        // Header only, no data chunk
        assert!(wav_duration(&encode_wav(&[], 16000)[..36]).is_none());
    }
}
