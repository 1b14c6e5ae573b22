pub const QUIZ_QUESTIONS_PROMPT: &str = "I want to create a quiz from some provided text. This will be used to test my understanding of the subject objectively. Generate 5 meaningful questions based on the provided text.

Answer with a single JSON object containing the fields question_1, question_2, question_3, question_4 and question_5. Each field holds one question, often between 5 and 15 words. No prose, no markdown, no extra keys.";

pub const SINGLE_MCQ_PROMPT: &str = "Generate one correct answer and three incorrect answers for the provided question, from the given document.

Answer with a single JSON object containing the fields correct, incorrect_1, incorrect_2 and incorrect_3. The correct answer must be supported by the document. Each answer is often between 1 and 10 words. The incorrect answers must be plausible but wrong. No prose, no markdown, no extra keys.";

pub const QUIZ_QUESTIONS_SCHEMA_NAME: &str = "quiz_questions";
pub const SINGLE_MCQ_SCHEMA_NAME: &str = "single_mcq";
