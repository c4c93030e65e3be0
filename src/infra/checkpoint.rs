// ============================================================
// Layer 6 — Model Checkpoint
// ============================================================
// One file holds everything needed to rebuild a StoryGan:
//
//   CheckpointRecord
//     format_version        ← schema version, checked on load
//     vocab_size … max_length ← GanConfig, fixes every shape
//     tokens                ← vocabulary, index order
//     generator             ← GeneratorRecord (all weights)
//     discriminator         ← DiscriminatorRecord
//
// Serialised as named MessagePack at full precision, so a
// reloaded model samples exactly like the one that was saved.
//
// Writes go to a temp file in the target directory and are then
// renamed over the destination: a crash mid-save leaves the old
// checkpoint intact.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkBytesRecorder, Record, Recorder},
};
use tempfile::NamedTempFile;

use crate::domain::vocabulary::Vocabulary;
use crate::error::{GanError, Result};
use crate::ml::{
    config::GanConfig,
    discriminator::{Discriminator, DiscriminatorRecord},
    gan::StoryGan,
    generator::{Generator, GeneratorRecord},
};

/// Bumped whenever the record layout changes.
pub const FORMAT_VERSION: usize = 1;

type CheckpointRecorder = NamedMpkBytesRecorder<FullPrecisionSettings>;

#[derive(Record)]
pub struct CheckpointRecord<B: Backend> {
    pub format_version: usize,
    pub vocab_size:     usize,
    pub embedding_dim:  usize,
    pub hidden_dim:     usize,
    pub num_layers:     usize,
    pub max_length:     usize,
    pub tokens:         Vec<String>,
    pub generator:      GeneratorRecord<B>,
    pub discriminator:  DiscriminatorRecord<B>,
}

/// Write `gan` to `path`, replacing any previous checkpoint atomically.
pub fn save<B: Backend>(gan: &StoryGan<B>, path: &Path) -> Result<()> {
    let config = gan.config();
    let record = CheckpointRecord::<B> {
        format_version: FORMAT_VERSION,
        vocab_size:     config.vocab_size,
        embedding_dim:  config.embedding_dim,
        hidden_dim:     config.hidden_dim,
        num_layers:     config.num_layers,
        max_length:     config.max_length,
        tokens:         gan.vocab().tokens().to_vec(),
        generator:      gan.generator.clone().into_record(),
        discriminator:  gan.discriminator.clone().into_record(),
    };

    let bytes = <CheckpointRecorder as Recorder<B>>::record(&CheckpointRecorder::default(), record, ())
        .map_err(|e| GanError::io(path, io::Error::other(format!("{e:?}"))))?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| GanError::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| GanError::io(dir, e))?;
    tmp.write_all(&bytes).map_err(|e| GanError::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| GanError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| GanError::io(path, e.error))?;

    tracing::info!("Saved checkpoint to '{}' ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Rebuild a StoryGan from `path`.
///
/// A missing file is `Ok(None)`; anything unreadable, of the wrong
/// version, or internally inconsistent is an error.
pub fn load<B: Backend>(path: &Path, device: &B::Device) -> Result<Option<StoryGan<B>>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!("No checkpoint at '{}'", path.display());
            return Ok(None);
        }
        Err(e) => return Err(GanError::io(path, e)),
    };

    let record: CheckpointRecord<B> =
        <CheckpointRecorder as Recorder<B>>::load(&CheckpointRecorder::default(), bytes, device)
            .map_err(|e| GanError::malformed(path, format!("{e:?}")))?;

    if record.format_version != FORMAT_VERSION {
        return Err(GanError::UnsupportedVersion {
            path:     path.to_path_buf(),
            found:    record.format_version,
            expected: FORMAT_VERSION,
        });
    }

    let config = GanConfig::new()
        .with_vocab_size(record.vocab_size)
        .with_embedding_dim(record.embedding_dim)
        .with_hidden_dim(record.hidden_dim)
        .with_num_layers(record.num_layers)
        .with_max_length(record.max_length);
    config.validate().map_err(|e| GanError::malformed(path, e))?;

    let vocab = Vocabulary::from_tokens(record.tokens).map_err(|e| GanError::malformed(path, e))?;
    if vocab.len() > config.vocab_size {
        return Err(GanError::malformed(
            path,
            format!("{} tokens do not fit vocab_size {}", vocab.len(), config.vocab_size),
        ));
    }

    let generator     = config.init_generator::<B>(device).load_record(record.generator);
    let discriminator = config.init_discriminator::<B>(device).load_record(record.discriminator);
    check_shapes(&config, &generator, &discriminator).map_err(|e| GanError::malformed(path, e))?;

    tracing::info!(
        "Loaded checkpoint '{}': {} tokens, {} layers",
        path.display(), vocab.len(), config.num_layers
    );
    Ok(Some(StoryGan::from_parts(config, vocab, generator, discriminator)))
}

fn check_shapes<B: Backend>(
    config:        &GanConfig,
    generator:     &Generator<B>,
    discriminator: &Discriminator<B>,
) -> std::result::Result<(), String> {
    let expect = |what: &str, found: [usize; 2], wanted: [usize; 2]| {
        if found == wanted {
            Ok(())
        } else {
            Err(format!("{what} has shape {found:?}, expected {wanted:?}"))
        }
    };

    let embedding = [config.vocab_size, config.embedding_dim];
    expect("generator embedding", generator.embedding.weight.val().dims(), embedding)?;
    expect("discriminator embedding", discriminator.embedding.weight.val().dims(), embedding)?;
    expect("generator output", generator.output.weight.val().dims(), [config.hidden_dim, config.vocab_size])?;
    expect("discriminator output", discriminator.output.weight.val().dims(), [config.hidden_dim, 1])?;

    for (name, layers) in [
        ("generator", generator.recurrent.num_layers()),
        ("discriminator", discriminator.recurrent.num_layers()),
    ] {
        if layers != config.num_layers {
            return Err(format!("{name} has {layers} LSTM layers, expected {}", config.num_layers));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::InferBackend;
    use rand::{rngs::StdRng, SeedableRng};

    fn tiny_gan() -> StoryGan<InferBackend> {
        let config = GanConfig::new()
            .with_vocab_size(30)
            .with_embedding_dim(6)
            .with_hidden_dim(7)
            .with_num_layers(2)
            .with_max_length(10);
        let mut gan = StoryGan::new(config, &Default::default()).unwrap();
        gan.build_vocabulary(&["小猫很可爱".to_string(), "我爱你".to_string()]).unwrap();
        gan
    }

    #[test]
    fn test_missing_checkpoint_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load::<InferBackend>(&dir.path().join("absent.mpk"), &Default::default()).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_load_reproduces_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("story_gan.mpk");
        let gan = tiny_gan();
        gan.save(&path).unwrap();

        let back = StoryGan::<InferBackend>::load(&path, &Default::default()).unwrap().unwrap();
        assert_eq!(back.config(), gan.config());
        assert_eq!(back.vocab(), gan.vocab());

        for seed in 0..3 {
            let a = gan.generate_tokens(0.8, &mut StdRng::seed_from_u64(seed)).unwrap();
            let b = back.generate_tokens(0.8, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert_eq!(a, b);
        }
        let (pa, pb) = (gan.classify("我爱你").unwrap(), back.classify("我爱你").unwrap());
        assert!((pa - pb).abs() < 1e-6);
    }

    #[test]
    fn test_save_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.mpk");
        tiny_gan().save(&path).unwrap();
        tiny_gan().save(&path).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_garbage_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.mpk");
        fs::write(&path, b"definitely not messagepack").unwrap();

        let err = load::<InferBackend>(&path, &Default::default()).unwrap_err();
        assert!(matches!(err, GanError::MalformedCheckpoint { .. }));
    }

    #[test]
    fn test_future_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.mpk");
        let gan = tiny_gan();
        let record = CheckpointRecord::<InferBackend> {
            format_version: FORMAT_VERSION + 1,
            vocab_size:     30,
            embedding_dim:  6,
            hidden_dim:     7,
            num_layers:     2,
            max_length:     10,
            tokens:         gan.vocab().tokens().to_vec(),
            generator:      gan.generator.clone().into_record(),
            discriminator:  gan.discriminator.clone().into_record(),
        };
        let bytes = <CheckpointRecorder as Recorder<InferBackend>>::record(
            &CheckpointRecorder::default(), record, (),
        )
        .unwrap();
        fs::write(&path, bytes).unwrap();

        let err = load::<InferBackend>(&path, &Default::default()).unwrap_err();
        assert!(matches!(err, GanError::UnsupportedVersion { found: 2, expected: 1, .. }));
    }
}
