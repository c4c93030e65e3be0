// ============================================================
// Layer 4 — Corpus Loaders
// ============================================================
// Two CorpusSource implementations:
//
//   TextCorpusLoader  → a UTF-8 file, or a directory of *.txt
//                       files, one story per line
//   SampleCorpus      → the ten short stories that ship with the
//                       binary, used when no corpus is given
//
// Both return cleaned stories (see Preprocessor).

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::data::preprocessor::Preprocessor;
use crate::domain::traits::CorpusSource;

/// Built-in training stories.
pub const SAMPLE_STORIES: [&str; 10] = [
    "小明今天去学校。他很喜欢学习中文。老师教他很多新的汉字。",
    "昨天下雨了。小红在家里看书。她喜欢读有趣的故事。",
    "爸爸妈妈去超市买菜。他们买了很多新鲜的水果和蔬菜。",
    "我的朋友来我家玩。我们一起看电影，吃好吃的零食。",
    "春天来了。花儿开了，树叶绿了。公园里有很多人在散步。",
    "小猫很可爱。它喜欢玩毛线球。每天晚上它都睡在我的床上。",
    "今天是周末。我和家人去公园玩。我们看到了很多美丽的花。",
    "老师给我们讲了一个有趣的故事。故事里有勇敢的王子和美丽的公主。",
    "我喜欢吃妈妈做的饭。她做的菜很好吃，特别是红烧肉。",
    "图书馆里有很多书。我经常去那里读书和学习。那里很安静。",
];

pub struct SampleCorpus;

impl CorpusSource for SampleCorpus {
    fn load_all(&self) -> Result<Vec<String>> {
        Ok(SAMPLE_STORIES.iter().map(|s| s.to_string()).collect())
    }
}

/// Loads stories from a text file or a directory of text files.
pub struct TextCorpusLoader {
    path: PathBuf,
}

impl TextCorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CorpusSource for TextCorpusLoader {
    fn load_all(&self) -> Result<Vec<String>> {
        let prep = Preprocessor::new();

        if self.path.is_file() {
            let stories = prep.split_stories(&read_text(&self.path)?);
            tracing::info!("Loaded {} stories from '{}'", stories.len(), self.path.display());
            return Ok(stories);
        }

        let mut files: Vec<PathBuf> = fs::read_dir(&self.path)
            .with_context(|| format!("Cannot read corpus path '{}'", self.path.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("txt"))
            .collect();
        // read_dir order is platform dependent; keep vocabulary ties stable
        files.sort();

        let mut stories = Vec::new();
        for file in &files {
            match read_text(file) {
                Ok(text) => stories.extend(prep.split_stories(&text)),
                // one unreadable file should not sink the whole corpus
                Err(e) => tracing::warn!("Skipping '{}': {:#}", file.display(), e),
            }
        }

        tracing::info!(
            "Loaded {} stories from {} files in '{}'",
            stories.len(),
            files.len(),
            self.path.display()
        );
        Ok(stories)
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Cannot read '{}'", path.display()))
}
