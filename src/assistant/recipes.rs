//! Recipe generation
//!
//! Turns model output into a [`RecipeCreate`], falling back to a randomized
//! template recipe when the model is unavailable or answers with something
//! unusable.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::prompts::recipe_prompt;
use super::{AssistantError, Source, TextGenerator};
use crate::models::{
    Cuisine, DietaryTag, Difficulty, Ingredient, Nutrition, RecipeCreate, RecipeMealType,
    DESCRIPTION_MAX_CHARS,
};

/// What the user asked for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeRequest {
    pub dish: String,
    #[serde(default)]
    pub dietary_preferences: Vec<DietaryTag>,
    pub servings: u32,
}

/// A generated recipe and where it came from
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedRecipe {
    pub recipe: RecipeCreate,
    pub source: Source,
    /// Why the fallback was used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

const MOCK_CUISINES: [Cuisine; 5] = [
    Cuisine::Mediterranean,
    Cuisine::Asian,
    Cuisine::Mexican,
    Cuisine::Italian,
    Cuisine::American,
];

const MOCK_MEAL_TYPES: [RecipeMealType; 4] = [
    RecipeMealType::Breakfast,
    RecipeMealType::Lunch,
    RecipeMealType::Dinner,
    RecipeMealType::Snack,
];

/// Template recipe with randomized cuisine, meal type, times and macros
pub fn mock_recipe<R: Rng + ?Sized>(rng: &mut R, request: &RecipeRequest) -> RecipeCreate {
    let cuisine = *MOCK_CUISINES.choose(rng).unwrap_or(&Cuisine::Other);
    let meal_type = *MOCK_MEAL_TYPES.choose(rng).unwrap_or(&RecipeMealType::Lunch);
    let dish = request.dish.trim();

    let ingredient = |name: &str, quantity: &str, unit: &str| Ingredient {
        name: name.to_string(),
        quantity: quantity.to_string(),
        unit: unit.to_string(),
    };

    RecipeCreate {
        name: format!("{} {}", cuisine, dish),
        description: Some(format!(
            "A delicious {} inspired {} that's perfect for {}. This healthy recipe is packed with flavor and nutrition.",
            cuisine.as_str().to_lowercase(),
            dish.to_lowercase(),
            meal_type.as_str().to_lowercase()
        )),
        ingredients: vec![
            ingredient("Fresh protein source", "200", "g"),
            ingredient("Seasonal vegetables", "2", "cups"),
            ingredient("Whole grains", "1", "cup"),
            ingredient("Healthy fats", "1", "tbsp"),
            ingredient("Herbs and spices", "2", "tsp"),
            ingredient("Citrus or vinegar", "1", "tbsp"),
        ],
        instructions: [
            "Prepare all ingredients by washing and chopping as needed",
            "Cook the main components using healthy methods",
            "Combine ingredients thoughtfully for maximum flavor",
            "Season with herbs, spices, and your preferred seasonings",
            "Cook until perfectly done and serve immediately",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
        prep_time: rng.gen_range(5..15),
        cook_time: rng.gen_range(15..40),
        servings: request.servings.max(1),
        nutrition: Nutrition {
            calories: rng.gen_range(300..500) as f64,
            protein: rng.gen_range(15..35) as f64,
            carbs: rng.gen_range(20..50) as f64,
            fat: rng.gen_range(5..15) as f64,
        },
        dietary_tags: request.dietary_preferences.clone(),
        cuisine,
        meal_type,
        difficulty: Difficulty::Easy,
        image: String::new(),
        created_by: None,
        ai_generated: true,
        original_request: Some(dish.to_string()),
        tags: if request.dietary_preferences.is_empty() {
            vec!["healthy".to_string(), "balanced".to_string()]
        } else {
            Vec::new()
        },
    }
}

/// Remove a surrounding markdown code fence, if any
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") up to the first newline
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Recipe JSON as the model is asked to produce it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelRecipe {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    ingredients: Vec<ModelIngredient>,
    #[serde(default)]
    instructions: Vec<String>,
    #[serde(default)]
    prep_time: f64,
    #[serde(default)]
    cook_time: f64,
    #[serde(default)]
    servings: Option<f64>,
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    #[serde(default)]
    dietary_tags: Vec<String>,
    #[serde(default)]
    cuisine: Option<String>,
    #[serde(default)]
    meal_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelIngredient {
    name: String,
    #[serde(default)]
    quantity: serde_json::Value,
    #[serde(default)]
    unit: String,
}

fn whole_number(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

/// Parse model output into a recipe.
///
/// Unknown dietary tags become free tags; an unknown cuisine becomes
/// `Other`; a meal type such as "Lunch/Dinner" takes its first known part.
pub fn parse_model_recipe(text: &str, request: &RecipeRequest) -> Result<RecipeCreate, AssistantError> {
    let parsed: ModelRecipe = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| AssistantError::Parse(e.to_string()))?;

    let mut dietary_tags = Vec::new();
    let mut tags = Vec::new();
    for tag in parsed.dietary_tags {
        match tag.parse::<DietaryTag>() {
            Ok(t) if !dietary_tags.contains(&t) => dietary_tags.push(t),
            Ok(_) => {}
            Err(_) => tags.push(tag),
        }
    }

    let meal_type = parsed
        .meal_type
        .as_deref()
        .and_then(|m| m.split(['/', ',']).find_map(|part| part.trim().parse().ok()))
        .unwrap_or(RecipeMealType::Lunch);

    let description = parsed
        .description
        .map(|d| d.chars().take(DESCRIPTION_MAX_CHARS).collect());

    let recipe = RecipeCreate {
        name: parsed.name.trim().to_string(),
        description,
        ingredients: parsed
            .ingredients
            .into_iter()
            .map(|i| Ingredient {
                name: i.name,
                quantity: match i.quantity {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                },
                unit: i.unit,
            })
            .collect(),
        instructions: parsed.instructions,
        prep_time: whole_number(parsed.prep_time),
        cook_time: whole_number(parsed.cook_time),
        servings: parsed.servings.map(whole_number).filter(|s| *s > 0).unwrap_or(request.servings.max(1)),
        nutrition: Nutrition {
            calories: parsed.calories,
            protein: parsed.protein,
            carbs: parsed.carbs,
            fat: parsed.fat,
        },
        dietary_tags,
        cuisine: parsed
            .cuisine
            .as_deref()
            .and_then(|c| c.parse().ok())
            .unwrap_or_default(),
        meal_type,
        difficulty: Difficulty::Easy,
        image: String::new(),
        created_by: None,
        ai_generated: true,
        original_request: Some(request.dish.trim().to_string()),
        tags,
    };

    recipe.validate().map_err(AssistantError::Parse)?;
    Ok(recipe)
}

/// Generate a recipe with the model, or a mock one when that is not possible
pub fn generate_recipe<R: Rng + ?Sized>(
    generator: Option<&dyn TextGenerator>,
    rng: &mut R,
    request: &RecipeRequest,
) -> GeneratedRecipe {
    let Some(generator) = generator else {
        tracing::info!(dish = %request.dish, "No Gemini API key, using mock recipe generation");
        return GeneratedRecipe {
            recipe: mock_recipe(rng, request),
            source: Source::Mock,
            fallback_reason: None,
        };
    };

    let prompt = recipe_prompt(&request.dish, &request.dietary_preferences, request.servings);
    let result = generator
        .generate(None, &prompt)
        .and_then(|text| parse_model_recipe(&text, request));

    match result {
        Ok(recipe) => GeneratedRecipe {
            recipe,
            source: Source::Gemini,
            fallback_reason: None,
        },
        Err(e) => {
            tracing::warn!(dish = %request.dish, error = %e, "Recipe generation failed, falling back to mock recipe");
            GeneratedRecipe {
                recipe: mock_recipe(rng, request),
                source: Source::Fallback,
                fallback_reason: Some(e.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Canned(Result<String, u16>);

    impl TextGenerator for Canned {
        fn generate(&self, _system: Option<&str>, _prompt: &str) -> Result<String, AssistantError> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(AssistantError::Api {
                    status: *status,
                    message: "unavailable".to_string(),
                }),
            }
        }
    }

    fn request() -> RecipeRequest {
        RecipeRequest {
            dish: "Quinoa Bowl".to_string(),
            dietary_preferences: vec![DietaryTag::Vegan],
            servings: 3,
        }
    }

    const MODEL_JSON: &str = r#"```json
{
  "name": "Sunny Quinoa Bowl",
  "description": "Bright and filling",
  "ingredients": [{"name": "Quinoa", "quantity": 1, "unit": "cup"}, {"name": "Lime", "quantity": "1/2", "unit": ""}],
  "instructions": ["Rinse", "Simmer", "Serve"],
  "prepTime": 10,
  "cookTime": 20.4,
  "servings": 2,
  "calories": 420,
  "protein": 14.5,
  "carbs": 60,
  "fat": 12,
  "dietaryTags": ["Vegan", "vegan", "Colorful"],
  "cuisine": "Fusion",
  "mealType": "Lunch/Dinner"
}
```"#;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```  "), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_model_recipe() {
        let recipe = parse_model_recipe(MODEL_JSON, &request()).unwrap();
        assert_eq!(recipe.name, "Sunny Quinoa Bowl");
        assert_eq!(recipe.ingredients[0].quantity, "1");
        assert_eq!(recipe.ingredients[1].quantity, "1/2");
        assert_eq!(recipe.cook_time, 20);
        assert_eq!(recipe.servings, 2);
        assert_eq!(recipe.dietary_tags, vec![DietaryTag::Vegan]);
        assert_eq!(recipe.tags, vec!["Colorful"]);
        assert_eq!(recipe.cuisine, Cuisine::Other);
        assert_eq!(recipe.meal_type, RecipeMealType::Lunch);
        assert!(recipe.ai_generated);
        assert_eq!(recipe.original_request.as_deref(), Some("Quinoa Bowl"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_model_recipe("Sorry, I cannot help with that.", &request()).is_err());
        assert!(parse_model_recipe(r#"{"name":"x","calories":-5,"protein":1,"carbs":1,"fat":1}"#, &request()).is_err());
    }

    #[test]
    fn test_mock_recipe_ranges() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let recipe = mock_recipe(&mut rng, &request());
            assert!((5..15).contains(&recipe.prep_time));
            assert!((15..40).contains(&recipe.cook_time));
            assert!((300.0..500.0).contains(&recipe.nutrition.calories));
            assert!(MOCK_CUISINES.contains(&recipe.cuisine));
            assert!(MOCK_MEAL_TYPES.contains(&recipe.meal_type));
            assert!(recipe.name.ends_with("Quinoa Bowl"));
            assert_eq!(recipe.servings, 3);
            assert_eq!(recipe.dietary_tags, vec![DietaryTag::Vegan]);
            assert!(recipe.validate().is_ok());
        }
    }

    #[test]
    fn test_mock_recipe_is_deterministic_for_a_seed() {
        let a = mock_recipe(&mut StdRng::seed_from_u64(1), &request());
        let b = mock_recipe(&mut StdRng::seed_from_u64(1), &request());
        assert_eq!(a.name, b.name);
        assert_eq!(a.nutrition, b.nutrition);
    }

    #[test]
    fn test_generate_recipe_sources() {
        let mut rng = StdRng::seed_from_u64(3);

        let mock = generate_recipe(None, &mut rng, &request());
        assert_eq!(mock.source, Source::Mock);

        let ok = Canned(Ok(MODEL_JSON.to_string()));
        let generated = generate_recipe(Some(&ok), &mut rng, &request());
        assert_eq!(generated.source, Source::Gemini);
        assert_eq!(generated.recipe.name, "Sunny Quinoa Bowl");

        let failing = Canned(Err(503));
        let fallback = generate_recipe(Some(&failing), &mut rng, &request());
        assert_eq!(fallback.source, Source::Fallback);
        assert!(fallback.fallback_reason.unwrap().contains("503"));

        let garbage = Canned(Ok("not json".to_string()));
        assert_eq!(generate_recipe(Some(&garbage), &mut rng, &request()).source, Source::Fallback);
    }
}
