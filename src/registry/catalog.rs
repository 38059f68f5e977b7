//! Built-in model catalog
//!
//! Pricing and timing figures are typical values used for estimates and
//! cost ceilings; the collaborator reports the actual cost of each call.

use serde_json::json;

use super::definition::{ModelDefinition, Pricing};
use super::ModelRegistry;
use crate::chain::StepType;

/// Register every built-in model into `registry`
pub fn register_builtin_models(registry: &mut ModelRegistry) {
    for definition in text_to_image()
        .into_iter()
        .chain(image_to_image())
        .chain(text_to_video())
        .chain(image_to_video())
        .chain(analysis())
        .chain(audio())
        .chain(video_processing())
    {
        registry.register(definition);
    }
}

fn text_to_image() -> Vec<ModelDefinition> {
    let common_ratios = ["1:1", "16:9", "9:16", "4:3", "3:4"];

    vec![
        ModelDefinition::new("flux_dev", "FLUX.1 Dev", "fal", "fal-ai/flux/dev")
            .category(StepType::TextToImage)
            .description("High quality 12B parameter text-to-image model")
            .pricing(Pricing::PerImage { rate: 0.025 })
            .cost_estimate(0.025)
            .processing_time(15.0)
            .aspect_ratios(&common_ratios)
            .defaults(json!({ "num_inference_steps": 28, "guidance_scale": 3.5 }))
            .features(&["high_quality", "prompt_adherence"]),
        ModelDefinition::new("flux_schnell", "FLUX.1 Schnell", "fal", "fal-ai/flux/schnell")
            .category(StepType::TextToImage)
            .description("Fast distilled FLUX variant")
            .pricing(Pricing::PerImage { rate: 0.003 })
            .cost_estimate(0.003)
            .processing_time(5.0)
            .aspect_ratios(&common_ratios)
            .defaults(json!({ "num_inference_steps": 4 }))
            .features(&["fast", "low_cost"]),
        ModelDefinition::new("imagen4", "Imagen 4", "fal", "fal-ai/imagen4/preview")
            .category(StepType::TextToImage)
            .description("Google photorealistic text-to-image model")
            .pricing(Pricing::PerImage { rate: 0.04 })
            .cost_estimate(0.04)
            .processing_time(20.0)
            .aspect_ratios(&common_ratios)
            .features(&["photorealistic", "text_rendering"]),
        ModelDefinition::new(
            "seedream_v3",
            "Seedream v3",
            "fal",
            "fal-ai/bytedance/seedream/v3/text-to-image",
        )
        .category(StepType::TextToImage)
        .description("Bilingual text-to-image model")
        .pricing(Pricing::PerImage { rate: 0.03 })
        .cost_estimate(0.03)
        .processing_time(15.0)
        .aspect_ratios(&common_ratios)
        .features(&["bilingual", "cinematic"]),
        ModelDefinition::new("nano_banana_pro", "Nano Banana Pro", "fal", "fal-ai/nano-banana-pro")
            .category(StepType::TextToImage)
            .description("Gemini-based image generation with strong text rendering")
            .pricing(Pricing::PerImage { rate: 0.15 })
            .cost_estimate(0.15)
            .processing_time(25.0)
            .resolutions(&["1K", "2K", "4K"])
            .aspect_ratios(&common_ratios)
            .defaults(json!({ "resolution": "1K" }))
            .features(&["text_rendering", "reasoning"]),
        ModelDefinition::new("gpt_image_1_5", "GPT Image 1.5", "fal", "fal-ai/gpt-image-1.5")
            .category(StepType::TextToImage)
            .description("OpenAI image generation")
            .pricing(Pricing::PerImage { rate: 0.04 })
            .cost_estimate(0.04)
            .processing_time(30.0)
            .aspect_ratios(&["1:1", "3:2", "2:3"])
            .defaults(json!({ "quality": "medium" }))
            .features(&["instruction_following"]),
    ]
}

fn image_to_image() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition::new("flux_kontext", "FLUX.1 Kontext Pro", "fal", "fal-ai/flux-pro/kontext")
            .category(StepType::ImageToImage)
            .description("Context-aware image editing")
            .pricing(Pricing::PerImage { rate: 0.04 })
            .cost_estimate(0.04)
            .processing_time(12.0)
            .defaults(json!({ "guidance_scale": 3.5 }))
            .features(&["editing", "character_consistency"]),
        ModelDefinition::new(
            "seededit_v3",
            "SeedEdit v3",
            "fal",
            "fal-ai/bytedance/seededit/v3/edit-image",
        )
        .category(StepType::ImageToImage)
        .description("Instruction-based image editing")
        .pricing(Pricing::Fixed { cost: 0.02 })
        .cost_estimate(0.02)
        .processing_time(10.0)
        .features(&["editing"]),
        ModelDefinition::new(
            "nano_banana_pro_edit",
            "Nano Banana Pro Edit",
            "fal",
            "fal-ai/nano-banana-pro/edit",
        )
        .category(StepType::ImageToImage)
        .description("Multi-image editing and composition")
        .pricing(Pricing::PerImage { rate: 0.15 })
        .cost_estimate(0.15)
        .processing_time(25.0)
        .resolutions(&["1K", "2K", "4K"])
        .features(&["editing", "composition"]),
    ]
}

fn text_to_video() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition::new(
            "hailuo_pro_t2v",
            "MiniMax Hailuo-02 Pro",
            "fal",
            "fal-ai/minimax/hailuo-02/pro/text-to-video",
        )
        .category(StepType::TextToVideo)
        .description("1080p text-to-video")
        .pricing(Pricing::Fixed { cost: 0.49 })
        .cost_estimate(0.49)
        .processing_time(180.0)
        .durations(&["6"])
        .resolutions(&["1080p"])
        .max_duration(6.0)
        .features(&["1080p"]),
        ModelDefinition::new(
            "kling_2_6_pro_t2v",
            "Kling v2.6 Pro",
            "fal",
            "fal-ai/kling-video/v2.6/pro/text-to-video",
        )
        .category(StepType::TextToVideo)
        .description("Cinematic text-to-video with native audio")
        .pricing(Pricing::PerSecond { rate: 0.07 })
        .cost_estimate(0.35)
        .processing_time(150.0)
        .durations(&["5", "10"])
        .aspect_ratios(&["16:9", "9:16", "1:1"])
        .max_duration(10.0)
        .defaults(json!({ "cfg_scale": 0.5 }))
        .features(&["native_audio", "cinematic"]),
        ModelDefinition::new("veo3_t2v", "Veo 3", "fal", "fal-ai/veo3")
            .category(StepType::TextToVideo)
            .description("Google text-to-video with synchronized audio")
            .pricing(Pricing::PerSecond { rate: 0.50 })
            .cost_estimate(4.0)
            .processing_time(300.0)
            .durations(&["4s", "6s", "8s"])
            .resolutions(&["720p", "1080p"])
            .aspect_ratios(&["16:9", "9:16"])
            .max_duration(8.0)
            .defaults(json!({ "duration": "8s", "generate_audio": true }))
            .features(&["native_audio", "high_fidelity"]),
    ]
}

fn image_to_video() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition::new("veo3", "Veo 3 Image-to-Video", "fal", "fal-ai/veo3/image-to-video")
            .category(StepType::ImageToVideo)
            .description("Animate an image with Veo 3, including audio")
            .pricing(Pricing::PerSecond { rate: 0.50 })
            .cost_estimate(4.0)
            .processing_time(300.0)
            .durations(&["8s"])
            .resolutions(&["720p", "1080p"])
            .max_duration(8.0)
            .defaults(json!({ "duration": "8s", "generate_audio": true }))
            .features(&["native_audio", "high_fidelity"]),
        ModelDefinition::new(
            "veo3_fast",
            "Veo 3 Fast Image-to-Video",
            "fal",
            "fal-ai/veo3/fast/image-to-video",
        )
        .category(StepType::ImageToVideo)
        .description("Faster, cheaper Veo 3 variant")
        .pricing(Pricing::PerSecond { rate: 0.25 })
        .cost_estimate(2.0)
        .processing_time(120.0)
        .durations(&["8s"])
        .max_duration(8.0)
        .defaults(json!({ "duration": "8s" }))
        .features(&["native_audio", "fast"]),
        ModelDefinition::new(
            "kling_2_6_pro",
            "Kling v2.6 Pro Image-to-Video",
            "fal",
            "fal-ai/kling-video/v2.6/pro/image-to-video",
        )
        .category(StepType::ImageToVideo)
        .description("Cinematic image-to-video")
        .pricing(Pricing::PerSecond { rate: 0.07 })
        .cost_estimate(0.35)
        .processing_time(150.0)
        .durations(&["5", "10"])
        .max_duration(10.0)
        .features(&["cinematic"]),
        ModelDefinition::new(
            "hailuo",
            "MiniMax Hailuo-02 Image-to-Video",
            "fal",
            "fal-ai/minimax/hailuo-02/standard/image-to-video",
        )
        .category(StepType::ImageToVideo)
        .description("768p image-to-video")
        .pricing(Pricing::PerSecond { rate: 0.045 })
        .cost_estimate(0.27)
        .processing_time(90.0)
        .durations(&["6", "10"])
        .resolutions(&["768p"])
        .max_duration(10.0)
        .defaults(json!({ "duration": "6" }))
        .features(&["budget"]),
        ModelDefinition::new("sora_2", "Sora 2", "fal", "fal-ai/sora-2/image-to-video")
            .category(StepType::ImageToVideo)
            .description("OpenAI image-to-video")
            .pricing(Pricing::PerSecond { rate: 0.10 })
            .cost_estimate(0.40)
            .processing_time(200.0)
            .durations(&["4", "8", "12"])
            .aspect_ratios(&["16:9", "9:16"])
            .max_duration(12.0)
            .defaults(json!({ "duration": "4" }))
            .features(&["physics", "native_audio"]),
    ]
}

fn analysis() -> Vec<ModelDefinition> {
    let gemini = "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash";
    let openrouter = "https://openrouter.ai/api/v1/chat/completions";

    vec![
        ModelDefinition::new("gemini_describe", "Gemini Image Description", "gemini", gemini)
            .category(StepType::ImageUnderstanding)
            .description("Short description of an image")
            .pricing(Pricing::Fixed { cost: 0.001 })
            .cost_estimate(0.001)
            .processing_time(3.0)
            .defaults(json!({ "analysis_type": "description" })),
        ModelDefinition::new("gemini_detailed", "Gemini Detailed Analysis", "gemini", gemini)
            .category(StepType::ImageUnderstanding)
            .description("Composition, objects, text and style analysis")
            .pricing(Pricing::Fixed { cost: 0.002 })
            .cost_estimate(0.002)
            .processing_time(6.0)
            .defaults(json!({ "analysis_type": "detailed" })),
        ModelDefinition::new(
            "openrouter_video_prompt",
            "OpenRouter Video Prompt",
            "openrouter",
            openrouter,
        )
        .category(StepType::PromptGeneration)
        .description("Turn an image into a motion prompt for video models")
        .pricing(Pricing::Fixed { cost: 0.002 })
        .cost_estimate(0.002)
        .processing_time(4.0)
        .defaults(json!({ "llm": "anthropic/claude-sonnet-4", "video_style": "cinematic" })),
        ModelDefinition::new(
            "openrouter_video_realistic",
            "OpenRouter Realistic Video Prompt",
            "openrouter",
            openrouter,
        )
        .category(StepType::PromptGeneration)
        .description("Documentary-style motion prompts")
        .pricing(Pricing::Fixed { cost: 0.002 })
        .cost_estimate(0.002)
        .processing_time(4.0)
        .defaults(json!({ "llm": "anthropic/claude-sonnet-4", "video_style": "realistic" })),
    ]
}

fn audio() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition::new(
            "elevenlabs",
            "ElevenLabs Multilingual v2",
            "elevenlabs",
            "https://api.elevenlabs.io/v1/text-to-speech",
        )
        .category(StepType::TextToSpeech)
        .description("Natural multilingual speech")
        .pricing(Pricing::PerThousandCharacters { rate: 0.30 })
        .cost_estimate(0.05)
        .processing_time(8.0)
        .defaults(json!({ "model_id": "eleven_multilingual_v2", "stability": 0.5 }))
        .features(&["multilingual", "voice_cloning"]),
        ModelDefinition::new(
            "elevenlabs_turbo",
            "ElevenLabs Turbo v2.5",
            "elevenlabs",
            "https://api.elevenlabs.io/v1/text-to-speech",
        )
        .category(StepType::TextToSpeech)
        .description("Low latency speech")
        .pricing(Pricing::PerThousandCharacters { rate: 0.15 })
        .cost_estimate(0.03)
        .processing_time(3.0)
        .defaults(json!({ "model_id": "eleven_turbo_v2_5" }))
        .features(&["low_latency"]),
        ModelDefinition::new(
            "elevenlabs_scribe",
            "ElevenLabs Scribe",
            "elevenlabs",
            "https://api.elevenlabs.io/v1/speech-to-text",
        )
        .category(StepType::SpeechToText)
        .description("Transcription with word timestamps and speaker labels")
        .pricing(Pricing::PerMinute { rate: 0.008 })
        .cost_estimate(0.02)
        .processing_time(15.0)
        .defaults(json!({ "diarize": true, "tag_audio_events": true }))
        .features(&["timestamps", "diarization"]),
        ModelDefinition::new("thinksound", "ThinkSound", "fal", "fal-ai/thinksound")
            .category(StepType::AddAudio)
            .description("Generate a soundtrack matching the video content")
            .pricing(Pricing::Fixed { cost: 0.05 })
            .cost_estimate(0.05)
            .processing_time(60.0)
            .features(&["video_to_audio"]),
        ModelDefinition::new("mmaudio_v2", "MMAudio v2", "fal", "fal-ai/mmaudio-v2")
            .category(StepType::AddAudio)
            .description("Synchronized sound effects for video")
            .pricing(Pricing::PerSecond { rate: 0.001 })
            .cost_estimate(0.01)
            .processing_time(30.0)
            .defaults(json!({ "num_steps": 25 }))
            .features(&["sound_effects"]),
    ]
}

fn video_processing() -> Vec<ModelDefinition> {
    vec![
        ModelDefinition::new("topaz", "Topaz Video Upscale", "fal", "fal-ai/topaz/upscale/video")
            .category(StepType::UpscaleVideo)
            .description("Professional video upscaling")
            .pricing(Pricing::Fixed { cost: 1.5 })
            .cost_estimate(1.5)
            .processing_time(240.0)
            .defaults(json!({ "upscale_factor": 2, "target_fps": 30 }))
            .features(&["upscale", "frame_interpolation"]),
        ModelDefinition::new(
            "omnihuman_v1_5",
            "OmniHuman v1.5",
            "fal",
            "fal-ai/bytedance/omnihuman/v1.5",
        )
        .category(StepType::Avatar)
        .description("Audio-driven talking avatar from a portrait")
        .pricing(Pricing::PerSecond { rate: 0.16 })
        .cost_estimate(1.6)
        .processing_time(300.0)
        .max_duration(30.0)
        .features(&["lip_sync", "full_body"]),
        ModelDefinition::new("fabric_1_0", "VEED Fabric 1.0", "fal", "fal-ai/veed/fabric-1.0")
            .category(StepType::Avatar)
            .description("Talking video from an image and audio")
            .pricing(Pricing::PerSecond { rate: 0.08 })
            .cost_estimate(0.8)
            .processing_time(180.0)
            .resolutions(&["480p", "720p"])
            .defaults(json!({ "resolution": "720p" }))
            .features(&["lip_sync"]),
        ModelDefinition::new("local_subtitles", "Local Subtitles", "local", "local://subtitles")
            .category(StepType::GenerateSubtitles)
            .description("Write SRT/VTT subtitles next to the video")
            .pricing(Pricing::Free)
            .processing_time(1.0)
            .defaults(json!({ "words_per_second": 2.0 })),
        ModelDefinition::new("ffmpeg_concat", "FFmpeg Concat", "local", "local://ffmpeg/concat")
            .category(StepType::ConcatVideos)
            .description("Join videos end to end")
            .pricing(Pricing::Free)
            .processing_time(5.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_is_consistent() {
        let registry = ModelRegistry::with_builtin_models();
        assert!(registry.validate().is_empty(), "{:?}", registry.validate());
    }

    #[test]
    fn test_every_step_type_has_a_model() {
        let registry = ModelRegistry::with_builtin_models();
        for step_type in StepType::ALL {
            assert!(
                !registry.keys_for_category(step_type).is_empty(),
                "no model for {}",
                step_type
            );
        }
    }

    #[test]
    fn test_local_models_are_free() {
        let registry = ModelRegistry::with_builtin_models();
        assert_eq!(registry.get("ffmpeg_concat").unwrap().pricing, Pricing::Free);
        assert_eq!(registry.get("local_subtitles").unwrap().cost_estimate, 0.0);
    }
}
