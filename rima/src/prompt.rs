use crate::behavior::BehaviorState;
use crate::config::Persona;
use crate::emotion::EmotionLabel;
use crate::generator::Message;

// A short steering line for the system prompt based on how the user sounds.
fn emotion_guidance(primary: EmotionLabel) -> &'static str {
    match primary {
        EmotionLabel::Anger => "Собеседник сейчас злится. Отвечай спокойно, без споров, помоги выговориться.",
        EmotionLabel::Joy => "Собеседник в отличном настроении. Радуйся вместе с ним!",
        EmotionLabel::Sadness => "Собеседнику грустно. Будь мягкой и поддержи его.",
        EmotionLabel::Neutral => "",
    }
}

fn behavior_hint(behavior: &BehaviorState) -> String {
    format!(
        "Твой уровень сарказма: {:.1} из 1. Твой уровень эмпатии: {:.1} из 1. Подстраивай тон под эти значения.",
        behavior.sarcasm_level(),
        behavior.empathy_level()
    )
}

pub fn build_prompt(
    message: &str,
    persona: &Persona,
    behavior: &BehaviorState,
    user_name: &str,
    primary_emotion: EmotionLabel,
    trigger_template: Option<&str>,
    important_facts: &[String],
    history: &[(String, String)],
) -> Vec<Message> {
    let mut system = format!(
        "Ты — {}, {}. Общайся неформально, как с близким другом. Ты любишь {}. Твоего друга зовут {}.",
        persona.name, persona.style, persona.likes, user_name
    );
    system.push(' ');
    system.push_str(&behavior_hint(behavior));
    let guidance = emotion_guidance(primary_emotion);
    if !guidance.is_empty() {
        system.push(' ');
        system.push_str(guidance);
    }
    if let Some(template) = trigger_template {
        system.push(' ');
        system.push_str(template);
    }
    if !important_facts.is_empty() {
        system.push_str(&format!(
            " Помни важное о {}: {}.",
            user_name,
            important_facts.join("; ")
        ));
    }

    let mut prompt = vec![Message::system(system)];
    for (user_text, bot_text) in history {
        prompt.push(Message::user(user_text.clone()));
        prompt.push(Message::assistant(bot_text.clone()));
    }
    prompt.push(Message::user(message.to_string()));
    prompt
}

// Emotive suffix for freshly generated replies, never for cached or fallback
// ones. Applied only when empathy is high enough to justify the extra warmth.
pub fn mood_tail(primary: EmotionLabel, behavior: &BehaviorState) -> Option<&'static str> {
    if behavior.empathy_level() < 0.7 {
        return None;
    }
    match primary {
        EmotionLabel::Joy => Some(" 🤗❤️ Так классно с тобой болтать!"),
        EmotionLabel::Sadness => Some(" 😔 Не переживай, я с тобой и готова поддержать!"),
        EmotionLabel::Anger | EmotionLabel::Neutral => None,
    }
}
