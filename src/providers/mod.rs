pub mod gemini;

pub use gemini::GeminiPriceProvider;
