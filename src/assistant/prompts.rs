//! Prompt templates

use crate::models::{ChatContext, ChatMessage, DietaryTag};

/// Exchanges of history included in a chat prompt
pub const CHAT_HISTORY_TURNS: usize = 6;

/// Prompt asking for one recipe as bare JSON
pub fn recipe_prompt(dish: &str, preferences: &[DietaryTag], servings: u32) -> String {
    let preferences = if preferences.is_empty() {
        "None".to_string()
    } else {
        preferences
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        r#"Create a detailed, healthy recipe for: "{dish}"
Dietary preferences: {preferences}
Servings: {servings}

Reply with the recipe in this exact JSON format:
{{
  "name": "Creative recipe name",
  "description": "Appetizing description, at most 500 characters",
  "ingredients": [
    {{"name": "ingredient name", "quantity": "amount", "unit": "unit"}}
  ],
  "instructions": ["step 1", "step 2", "step 3", "step 4", "step 5"],
  "prepTime": number,
  "cookTime": number,
  "servings": number,
  "calories": number,
  "protein": number,
  "carbs": number,
  "fat": number,
  "dietaryTags": ["tag1", "tag2"],
  "cuisine": "type of cuisine",
  "mealType": "Breakfast, Lunch, Dinner or Snack"
}}

Nutrition values are per serving. Make it healthy, delicious, easy to follow and
nutritionally balanced. Return ONLY the JSON, no additional text."#
    )
}

/// System instruction for the nutrition chat
pub fn chat_system_prompt(context: &ChatContext) -> String {
    let list = |items: &[String]| {
        if items.is_empty() {
            "none".to_string()
        } else {
            items.join(", ")
        }
    };

    format!(
        r#"You are MealGenius, a friendly and professional AI nutritionist.
Provide helpful, accurate nutrition advice and healthy meal suggestions.
Be encouraging and supportive in your responses.
Always consider dietary preferences and health goals when giving advice.

User context:
- Dietary preferences: {}
- Health conditions: {}
- Goal: {}
- Activity level: {}

Guidelines:
- Give practical, evidence-based advice
- Suggest specific foods and recipes when appropriate
- Respect the user's dietary preferences and restrictions
- Keep responses concise but informative
- When suggesting a recipe, give clear instructions
- Never give medical advice; recommend consulting a healthcare professional for medical concerns"#,
        list(&context.dietary_preferences),
        list(&context.health_conditions),
        context.goal.as_deref().unwrap_or("not set"),
        context.activity_level.as_deref().unwrap_or("not set"),
    )
}

/// User prompt carrying the recent conversation and the new message
pub fn chat_prompt(history: &[ChatMessage], message: &str) -> String {
    let start = history.len().saturating_sub(CHAT_HISTORY_TURNS);
    let mut prompt = String::new();

    if start < history.len() {
        prompt.push_str("Conversation so far:\n");
        for exchange in &history[start..] {
            prompt.push_str(&format!("User: {}\nAssistant: {}\n", exchange.message, exchange.response));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("User: {}\n\nAssistant:", message.trim()));
    prompt
}
