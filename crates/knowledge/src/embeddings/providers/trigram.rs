//! Trigram embedding provider for offline use.

use crate::embeddings::provider::EmbeddingProvider;
use policyqa_core::AppResult;
use std::collections::HashMap;

/// Portuguese function words that carry no topical signal.
const STOP_WORDS: &[&str] = &[
    "que", "para", "com", "uma", "por", "mais", "como", "dos", "das", "nos", "nas", "pelo",
    "pela", "seu", "sua", "seus", "suas", "ser", "são", "sao", "tem", "ter", "este", "esta",
    "isso", "esse", "essa", "quando", "onde", "qual", "quais", "não", "nao", "sem", "sobre",
    "entre", "até", "ate", "também", "tambem", "ou", "ao", "aos", "the", "and", "for",
];

/// Deterministic hashing embedder.
///
/// Words are accent-folded, stop words dropped, and each word is spread over
/// the vector through its character trigrams plus one whole-word bucket.
/// Vectors are unit length, so squared L2 distances fall in `[0, 4]`.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0; self.dimensions];

        let mut word_freq: HashMap<String, u32> = HashMap::new();
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2)
            .map(|w| w.to_lowercase())
            .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        {
            *word_freq.entry(fold_accents(&word)).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for trigram in chars.windows(3) {
                let idx = bucket(trigram.iter().collect::<String>().as_bytes(), 37, self.dimensions);
                embedding[idx] += (*freq as f32).sqrt();
            }

            let idx = bucket(word.as_bytes(), 31, self.dimensions);
            embedding[idx] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

fn bucket(bytes: &[u8], multiplier: u64, dimensions: usize) -> usize {
    let hash = bytes
        .iter()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(*b as u64));
    (hash % dimensions as u64) as usize
}

fn fold_accents(word: &str) -> String {
    word.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.generate(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
    }

    #[tokio::test]
    async fn test_unit_length() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("Política de férias").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = TrigramProvider::new(384);
        let a = provider.embed("configuração da VPN").await.unwrap();
        let b = provider.embed("configuração da VPN").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_accents_and_case_are_folded() {
        let provider = TrigramProvider::new(384);
        let a = provider.embed("FÉRIAS").await.unwrap();
        let b = provider.embed("ferias").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_related_text_is_closer() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed("Como configuro a VPN?").await.unwrap();
        let vpn = provider
            .embed("Para configurar a VPN instale o cliente e use seu login corporativo.")
            .await
            .unwrap();
        let ferias = provider
            .embed("O colaborador tem direito a trinta dias de férias por ano.")
            .await
            .unwrap();

        assert!(squared_l2(&query, &vpn) < squared_l2(&query, &ferias));
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let provider = TrigramProvider::new(64);
        let embedding = provider.embed("").await.unwrap();
        assert_eq!(embedding.len(), 64);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let provider = TrigramProvider::new(128);
        let texts = vec!["senha".to_string(), "férias".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], provider.embed("férias").await.unwrap());
    }
}
