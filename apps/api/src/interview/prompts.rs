// All LLM prompt constants for the Interview module.
// Report and improvement calls use the shared JSON_ONLY_SYSTEM from llm_client::prompts.

/// System prompt for question generation.
pub const QUESTIONS_SYSTEM: &str = "You are an expert HR and technical interviewer. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON array. \
    Do NOT use markdown code fences.";

/// Question generation template. Replace `{resume_text}`, `{job_title}`,
/// `{years_of_experience}`, `{key_skills}`, `{target_role}` and `{industry_focus}`.
pub const QUESTIONS_PROMPT_TEMPLATE: &str = r#"Generate 20 interview questions based on the resume and candidate inputs below.
The first 10 questions are the HR round; the next 10 are the technical round.
Tailor the questions to the candidate's experience and the target role.
Include technical questions, behavioural questions, and questions about their past work.
Ask each question only once.

Resume:
{resume_text}

Current Job Title: {job_title}
Years of Experience: {years_of_experience}
Key Skills: {key_skills}
Target Role: {target_role}
Industry Focus: {industry_focus}

Return a JSON array of 20 strings, one question per element, in the order they should be asked."#;

/// System prompt for single-answer analysis. Plain text output.
pub const ANALYSIS_SYSTEM: &str = "You are an interview coach. \
    Give a short, plain-text assessment of the candidate's answer. \
    Do NOT use markdown.";

/// Answer analysis template. Replace `{answer_text}`.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following interview answer. Summarize what the candidate said and note its strengths and weaknesses.

Answer:
{answer_text}"#;

/// Report generation template. Replace `{resume_text}`, `{inputs_json}` and `{qa_json}`.
pub const REPORT_PROMPT_TEMPLATE: &str = r#"You are an expert interview assessor. Analyze the interview questions and answers below.
Produce:
1. Overall score (0-100)
2. Accuracy of answers (0-100)
3. Areas of improvement (list)
4. Grammatical improvements (list)
5. Technical improvements (list)
6. Feedback for each question, in the same order as the questions
7. Score for each question (0-100), in the same order as the questions

Resume:
{resume_text}

Candidate Inputs:
{inputs_json}

Questions and Answers:
{qa_json}

Return a JSON object with this EXACT schema:
{
  "overallScore": 0,
  "accuracy": 0,
  "areasOfImprovement": ["..."],
  "grammaticalImprovements": ["..."],
  "technicalImprovements": ["..."],
  "questionFeedback": ["one string per question"],
  "questionScores": [0]
}
questionFeedback and questionScores MUST each contain exactly {count} elements."#;

/// Improved answer template. Replace `{qa_json}` and `{count}`.
pub const IMPROVE_PROMPT_TEMPLATE: &str = r#"You are an expert interview coach. For each interview question and answer below,
write an improved version of the answer that would score higher in an interview.
Make the answers more professional, specific, and impactful.

Questions and Answers:
{qa_json}

Return only a JSON array of exactly {count} strings, one improved answer per question, in the same order."#;
