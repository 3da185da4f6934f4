use std::fmt;
use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Languages the analysis engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisLanguage {
	Javascript,
	TypeScript,
	Css,
	Html,
	CFamily,
	CSharp,
	VbNet,
	/// Secret detection applies to any text file.
	Secrets,
}

impl AnalysisLanguage {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Javascript => "js",
			Self::TypeScript => "ts",
			Self::Css => "css",
			Self::Html => "html",
			Self::CFamily => "cfamily",
			Self::CSharp => "cs",
			Self::VbNet => "vbnet",
			Self::Secrets => "secrets",
		}
	}

	/// Primary language for a file extension, if any.
	pub fn from_extension(ext: &str) -> Option<Self> {
		let lang = match ext.to_ascii_lowercase().as_str() {
			"js" | "jsx" | "mjs" | "cjs" | "vue" => Self::Javascript,
			"ts" | "tsx" | "mts" | "cts" => Self::TypeScript,
			"css" | "scss" | "less" => Self::Css,
			"html" | "htm" => Self::Html,
			"c" | "cc" | "cpp" | "cxx" | "h" | "hh" | "hpp" | "hxx" => Self::CFamily,
			"cs" => Self::CSharp,
			"vb" => Self::VbNet,
			_ => return None,
		};
		Some(lang)
	}

	/// Detected languages in priority order: the primary language (if any)
	/// followed by [`AnalysisLanguage::Secrets`].
	pub fn detect(path: &Path) -> IndexSet<Self> {
		let mut languages = IndexSet::new();
		if let Some(lang) = path.extension().and_then(|ext| ext.to_str()).and_then(Self::from_extension) {
			languages.insert(lang);
		}
		languages.insert(Self::Secrets);
		languages
	}
}

impl fmt::Display for AnalysisLanguage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
