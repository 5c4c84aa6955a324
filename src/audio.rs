use std::fs::File;
use std::path::Path;

use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;

use crate::error::DatasetError;

/// Report an audio file's duration in milliseconds.
///
/// Prefers the frame count declared in the container header. MP3 files
/// without one (no Xing/Info tag) are walked packet by packet instead, which
/// still only parses frame headers and never decodes samples.
pub fn probe_duration_ms(path: &Path) -> Result<f64, DatasetError> {
    let unreadable = |source| DatasetError::UnreadableAudio {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|e| unreadable(SymphoniaError::IoError(e)))?;
    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(unreadable)?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| unreadable(SymphoniaError::Unsupported("no audio track")))?;

    let track_id = track.id;
    let time_base = track.codec_params.time_base;
    let n_frames = track.codec_params.n_frames;
    let sample_rate = track.codec_params.sample_rate;

    if let Some(frames) = n_frames {
        if let Some(tb) = time_base {
            return Ok(timestamp_ms(tb, frames));
        }
        if let Some(rate) = sample_rate {
            return Ok(frames as f64 / rate as f64 * 1000.0);
        }
    }

    let tb = time_base.ok_or_else(|| unreadable(SymphoniaError::Unsupported("no time base")))?;
    let mut last_ts = 0u64;
    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() == track_id {
                    last_ts = last_ts.max(packet.ts() + packet.dur());
                }
            }
            Err(SymphoniaError::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(unreadable(e)),
        }
    }

    Ok(timestamp_ms(tb, last_ts))
}

fn timestamp_ms(time_base: TimeBase, timestamp: u64) -> f64 {
    let time = time_base.calc_time(timestamp);
    (time.seconds as f64 + time.frac) * 1000.0
}
