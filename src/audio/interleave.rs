//! Channel interleaving and mono downmix.
//!
//! The WAV encoder consumes a single frame-major stream
//! (`L0 R0 L1 R1 …`).  [`mix_to`] turns planar channel arrays into that
//! stream for the requested output channel count.

use thiserror::Error;

// ---------------------------------------------------------------------------
// ChannelMismatchError
// ---------------------------------------------------------------------------

/// Channel arrays cannot be combined into the requested layout.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelMismatchError {
    /// No channel arrays were supplied.
    #[error("no channels supplied")]
    NoChannels,

    /// A channel's length differs from channel 0.
    #[error("channel {channel} has {got} samples, expected {expected}")]
    UnequalLengths {
        channel: usize,
        expected: usize,
        got: usize,
    },

    /// There is no defined mapping between the two channel counts.
    #[error("cannot map {from} source channels to {to} output channels")]
    UnsupportedMapping { from: usize, to: u16 },
}

/// Verify all channel arrays have the length of channel 0.
pub(crate) fn check_equal_lengths(channels: &[Vec<f32>]) -> Result<usize, ChannelMismatchError> {
    let expected = channels
        .first()
        .ok_or(ChannelMismatchError::NoChannels)?
        .len();

    for (channel, ch) in channels.iter().enumerate().skip(1) {
        if ch.len() != expected {
            return Err(ChannelMismatchError::UnequalLengths {
                channel,
                expected,
                got: ch.len(),
            });
        }
    }
    Ok(expected)
}

// ---------------------------------------------------------------------------
// interleave
// ---------------------------------------------------------------------------

/// Merge planar channels into one frame-major stream.
///
/// ```rust
/// use voice_classify::audio::interleave;
///
/// let out = interleave(&[vec![1.0, 2.0], vec![-1.0, -2.0]]).unwrap();
/// assert_eq!(out, vec![1.0, -1.0, 2.0, -2.0]);
/// ```
pub fn interleave(channels: &[Vec<f32>]) -> Result<Vec<f32>, ChannelMismatchError> {
    let frames = check_equal_lengths(channels)?;

    if let [mono] = channels {
        return Ok(mono.clone());
    }

    let mut out = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        out.extend(channels.iter().map(|ch| ch[i]));
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Average all channels per frame.
///
/// Averaging keeps content that only exists in one channel, which picking
/// channel 0 would lose.
pub fn downmix_to_mono(channels: &[Vec<f32>]) -> Result<Vec<f32>, ChannelMismatchError> {
    let frames = check_equal_lengths(channels)?;

    if let [mono] = channels {
        return Ok(mono.clone());
    }

    let n = channels.len() as f32;
    Ok((0..frames)
        .map(|i| channels.iter().map(|ch| ch[i]).sum::<f32>() / n)
        .collect())
}

// ---------------------------------------------------------------------------
// mix_to
// ---------------------------------------------------------------------------

/// Produce the interleaved stream for `target_channels` output channels.
///
/// | source | target | result |
/// |--------|--------|--------|
/// | n      | n      | plain interleave |
/// | n      | 1      | per-frame average |
/// | 1      | n      | mono duplicated into every channel |
/// | any    | 0      | empty stream, 0 channels (the encoder rejects it) |
///
/// Any other combination is [`ChannelMismatchError::UnsupportedMapping`].
pub fn mix_to(
    channels: &[Vec<f32>],
    target_channels: u16,
) -> Result<(Vec<f32>, u16), ChannelMismatchError> {
    let frames = check_equal_lengths(channels)?;
    let source = channels.len();

    match target_channels {
        0 => Ok((Vec::new(), 0)),
        1 => Ok((downmix_to_mono(channels)?, 1)),
        n if n as usize == source => Ok((interleave(channels)?, n)),
        n if source == 1 => {
            let mono = &channels[0];
            let mut out = Vec::with_capacity(frames * n as usize);
            for &s in mono {
                out.extend(std::iter::repeat(s).take(n as usize));
            }
            Ok((out, n))
        }
        n => Err(ChannelMismatchError::UnsupportedMapping {
            from: source,
            to: n,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
