// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Scenario generation prompt. Replace `{insights}` before sending.
pub const SCENARIOS_PROMPT_TEMPLATE: &str = r#"Baserat på följande insikter från en rekryteringsdialog, ta fram tre alternativa lösningsscenarier.

INSIKTER:
{insights}

Returnera en JSON-array med EXAKT denna struktur (inga extra fält):
[
  {
    "title": "Kort namn på scenariot",
    "description": "Två till tre meningar om upplägget",
    "pros": ["fördel"],
    "cons": ["nackdel"],
    "estimated_cost": "t.ex. 650 000 kr/år",
    "time_to_hire": "t.ex. 8-12 veckor"
  }
]

REGLER:
1. Scenarierna ska skilja sig åt på riktigt (t.ex. anställning, konsult, intern omställning).
2. Kostnader och tider ska vara realistiska för den svenska marknaden.
3. Returnera ENDAST JSON-arrayen."#;

/// Action plan prompt. Replace `{insights}` and `{scenario}` before sending.
pub const ACTION_PLAN_PROMPT_TEMPLATE: &str = r#"Ta fram en konkret handlingsplan för att genomföra det valda scenariot.

VALT SCENARIO:
{scenario}

INSIKTER:
{insights}

Returnera ett JSON-objekt med EXAKT denna struktur:
{
  "steps": [
    {"week": 1, "title": "Steg", "owner": "Ansvarig roll", "description": "Vad som ska göras"}
  ],
  "success_metrics": ["Mätbart mål"]
}

REGLER:
1. Stegen ska vara sorterade på vecka.
2. Varje steg ska ha en tydlig ansvarig.
3. Returnera ENDAST JSON-objektet."#;
