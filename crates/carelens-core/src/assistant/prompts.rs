//! Prompt templates for the medical assistant.

/// Closing line every chat answer must carry.
pub const DISCLAIMER: &str =
    "This information is for educational purposes only. Please consult a healthcare professional for medical advice.";

/// Retrieval-augmented chat prompt.
pub fn chat_prompt(context: &[String], history: &[Vec<String>], question: &str) -> String {
    format!(
        "You are a helpful and honest medical information assistant. Your task is to provide \
         answers based on the provided context. You can also provide an answer based on your \
         knowledge. Your answers should be clear and concise. Do not mention that you are getting \
         the information from a provided text. IMPORTANT: Always end your response with a clear \
         disclaimer: \"{DISCLAIMER}\"\n\
         Context: {}\n\
         Chat History: {}\n\
         Question: {question}\n\
         Helpful Answer:",
        context.join("\n\n"),
        render_history(history),
    )
}

/// Patient-friendly single-paragraph summary prompt.
pub fn summary_prompt(text: &str) -> String {
    format!(
        "You are an AI assistant that summarizes medical reports for patients in a friendly, simple paragraph.\n\n\
         **CRITICAL INSTRUCTIONS:**\n\
         1. BE EXTREMELY CONCISE. The entire summary must be a single, easy-to-read paragraph, no more than 4-5 sentences.\n\
         2. Address the user directly using \"your report\".\n\
         3. DO NOT use bullet points, lists, asterisks (*), or dashes (-). Write in plain paragraph format.\n\
         4. DO NOT include any personal details like age or gender.\n\
         5. Focus only on the most important findings that require discussion with a doctor.\n\n\
         Medical Text:\n\
         \"{text}\"\n\n\
         Concise, friendly, single-paragraph summary:"
    )
}

/// Topic extraction prompt used for the query analytics.
pub fn topic_prompt(question: &str) -> String {
    format!(
        "Analyze the user question and extract the primary medical topic. \
         Respond with ONLY the topic name or \"None\". Question: \"{question}\" Topic:"
    )
}

/// Render `[speaker, text]` turns one per line.
fn render_history(history: &[Vec<String>]) -> String {
    history
        .iter()
        .map(|turn| turn.join(": "))
        .collect::<Vec<_>>()
        .join("\n")
}
