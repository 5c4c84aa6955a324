use std::fs::{self, File};
use std::io::{Cursor, Write};
use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};
use zip::write::SimpleFileOptions;

use beatset::dataset::{
    Checkpoint, convert_directory, export_song_info, export_timing_points, partition_directory,
};

const STEADY_CHART: &str = "\
osu file format v14

[General]
AudioFilename: audio.wav

[Metadata]
Title:Steady Song
Artist:Some Artist
Creator:mapper
Tags:test

[TimingPoints]
0,500,4,2,0,60,1,0
";

const CLOSE_TIMINGS_CHART: &str = "\
[General]
AudioFilename: audio.wav

[TimingPoints]
0,500,4,2,0,60,1,0
3000,400,4,2,0,60,1,0
";

/// Two seconds of silence, 44.1 kHz mono.
fn silent_wav(seconds: f64) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).expect("failed to create wav");
        for _ in 0..(44100.0 * seconds) as u64 {
            writer.write_sample(0i16).expect("failed to write sample");
        }
        writer.finalize().expect("failed to finalize wav");
    }
    cursor.into_inner()
}

fn write_osz(path: &Path, chart: &str, wav: &[u8]) {
    let file = File::create(path).expect("failed to create osz");
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    zip.start_file("chart.osu", options)
        .expect("failed to add chart");
    zip.write_all(chart.as_bytes()).expect("failed to write chart");
    zip.start_file("audio.wav", options)
        .expect("failed to add audio");
    zip.write_all(wav).expect("failed to write audio");
    zip.finish().expect("failed to finish zip");
}

#[test]
fn test_convert_produces_audio_and_annotations() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let input = dir.path().join("input");
    let output = dir.path().join("dataset");
    fs::create_dir(&input).unwrap();
    write_osz(&input.join("steady.osz"), STEADY_CHART, &silent_wav(2.0));

    let converted = convert_directory(&input, &output, None).expect("convert failed");
    assert_eq!(converted, 1);

    assert!(output.join("audio/steady.wav").is_file());
    let annotations =
        fs::read_to_string(output.join("annotations/steady_beats_metered.txt")).unwrap();
    assert_eq!(
        annotations,
        "0.000000\t1\n0.500000\t2\n1.000000\t3\n1.500000\t4\n"
    );
}

#[test]
fn test_convert_skips_bad_archive_and_continues() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let input = dir.path().join("input");
    let output = dir.path().join("dataset");
    fs::create_dir(&input).unwrap();
    fs::write(input.join("broken.osz"), b"definitely not a zip").unwrap();
    write_osz(&input.join("steady.osz"), STEADY_CHART, &silent_wav(2.0));

    let converted = convert_directory(&input, &output, None).expect("convert failed");

    assert_eq!(converted, 1);
    assert!(output.join("annotations/steady_beats_metered.txt").is_file());
    // The failed item leaves no partial outputs behind.
    assert!(!output.join("audio/broken.wav").exists());
    assert!(!output.join("annotations/broken_beats_metered.txt").exists());
}

#[test]
fn test_convert_resumes_from_checkpoint() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let input = dir.path().join("input");
    let output = dir.path().join("dataset");
    let marker = dir.path().join("checkpoint.json");
    fs::create_dir(&input).unwrap();
    write_osz(&input.join("a.osz"), STEADY_CHART, &silent_wav(2.0));

    let mut checkpoint = Checkpoint::load(&marker);
    let first = convert_directory(&input, &output, Some(&mut checkpoint)).unwrap();
    assert_eq!(first, 1);
    assert_eq!(checkpoint.last_processed(), Some("a.osz"));

    // A second run with the same marker skips the already-processed archive.
    let annotation = output.join("annotations/a_beats_metered.txt");
    fs::remove_file(&annotation).unwrap();
    let mut checkpoint = Checkpoint::load(&marker);
    let second = convert_directory(&input, &output, Some(&mut checkpoint)).unwrap();
    assert_eq!(second, 0);
    assert!(!annotation.exists());

    // New archives after the marker are picked up.
    write_osz(&input.join("b.osz"), STEADY_CHART, &silent_wav(2.0));
    let mut checkpoint = Checkpoint::load(&marker);
    let third = convert_directory(&input, &output, Some(&mut checkpoint)).unwrap();
    assert_eq!(third, 1);
    assert_eq!(checkpoint.last_processed(), Some("b.osz"));
}

#[test]
fn test_song_info_csv() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let input = dir.path().join("input");
    let csv_path = dir.path().join("song_info.csv");
    fs::create_dir(&input).unwrap();
    write_osz(&input.join("steady.osz"), STEADY_CHART, &silent_wav(2.0));

    let written = export_song_info(&input, &csv_path).expect("export failed");
    assert_eq!(written, 1);

    let content = fs::read_to_string(&csv_path).unwrap();
    let mut lines = content.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("song_name,title,artist"));

    let row = lines.next().unwrap();
    assert!(row.contains("steady"));
    assert!(row.contains("Steady Song"));
    assert!(row.contains("Some Artist"));
    // One uninherited point over 2 s of audio: variation rating 0.
    assert!(row.ends_with(",0.0") || row.ends_with(",0"));
}

#[test]
fn test_partition_moves_archives() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let input = dir.path().join("input");
    let output = dir.path().join("partitioned");
    fs::create_dir(&input).unwrap();
    write_osz(&input.join("steady.osz"), STEADY_CHART, &silent_wav(0.1));
    write_osz(
        &input.join("shifty.osz"),
        CLOSE_TIMINGS_CHART,
        &silent_wav(0.1),
    );

    let summary = partition_directory(&input, &output, 5000.0).expect("partition failed");

    assert_eq!(summary.single, 1);
    assert_eq!(summary.close, 1);
    assert_eq!(summary.spread, 0);
    assert_eq!(summary.failed, 0);
    assert!(output.join("single_timing_point/steady.osz").is_file());
    assert!(output.join("multiple_timings_close/shifty.osz").is_file());
    assert!(!input.join("steady.osz").exists());
}

#[test]
fn test_timing_point_export() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let input = dir.path().join("input");
    let output = dir.path().join("timing");
    fs::create_dir(&input).unwrap();
    write_osz(&input.join("steady.osz"), STEADY_CHART, &silent_wav(0.5));

    let exported = export_timing_points(&input, &output).expect("export failed");
    assert_eq!(exported, 1);

    let json = fs::read_to_string(output.join("timing_points/steady_uninherited.json")).unwrap();
    let points: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(points.as_array().unwrap().len(), 1);
    assert_eq!(points[0]["beat_length"], 500.0);
    assert_eq!(points[0]["meter"], 4);
    assert!(output.join("audio/steady.wav").is_file());
}

#[test]
fn test_missing_audio_fails_item() {
    let dir = tempfile::tempdir().expect("failed to create temp directory");
    let input = dir.path().join("input");
    let output = dir.path().join("dataset");
    fs::create_dir(&input).unwrap();

    // Chart references audio.wav but the archive only carries the chart.
    let file = File::create(input.join("noaudio.osz")).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file("chart.osu", options).unwrap();
    zip.write_all(STEADY_CHART.as_bytes()).unwrap();
    zip.finish().unwrap();

    let converted = convert_directory(&input, &output, None).expect("convert failed");
    assert_eq!(converted, 0);
}
