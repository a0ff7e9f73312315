use tantivy::tokenizer::{LowerCaser, RawTokenizer, TextAnalyzer, TokenStream};

/// Lowercase + whitespace split. No stemming, no stop words: every query and
/// every chunk goes through this same pipeline.
///
/// Words are cut on Unicode whitespace, so non-breaking spaces in PDF text
/// separate tokens too. Each word is then lowercased by the tantivy chain.
#[derive(Clone)]
pub struct LexicalAnalyzer {
	inner: TextAnalyzer,
}

impl Default for LexicalAnalyzer {
	fn default() -> Self {
		let inner = TextAnalyzer::builder(RawTokenizer::default())
			.filter(LowerCaser)
			.build();
		Self { inner }
	}
}

impl LexicalAnalyzer {
	pub fn new() -> Self { Self::default() }

	pub fn tokenize(&mut self, text: &str) -> Vec<String> {
		let mut tokens = Vec::new();
		for word in text.split_whitespace() {
			let mut stream = self.inner.token_stream(word);
			while stream.advance() {
				tokens.push(stream.token().text.clone());
			}
		}
		tokens
	}
}
