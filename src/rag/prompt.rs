//! Prompt assembly for grounded answers.

/// Build the instruction sent to the chat model.
///
/// The context is embedded verbatim between a fixed instruction header and the
/// user question. An empty (or whitespace-only) context yields the bare
/// question; the query path never reaches here in that case, but callers get a
/// sensible prompt either way.
pub fn build_prompt(question: &str, context: &str) -> String {
    if context.trim().is_empty() {
        return question.to_string();
    }

    format!(
        "请基于以下上下文信息回答用户的问题。如果上下文中没有相关信息，请说明无法找到相关信息。\n\
         \n\
         上下文信息：\n\
         {context}\n\
         \n\
         用户问题：{question}\n\
         \n\
         请给出准确、有帮助的回答：\n"
    )
}

/// Join retrieved chunk texts in retrieval order, separated by a blank line.
pub fn join_context<'a, I>(texts: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    texts.into_iter().collect::<Vec<_>>().join("\n\n")
}
