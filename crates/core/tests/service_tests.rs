// ═══════════════════════════════════════════════════════════════════
// Service Tests — ProfileService, SwipeSession, QuestionSelection,
// QuizService, LearningSession, QuickLearnSession, FetchGate
// ═══════════════════════════════════════════════════════════════════

use serde_json::json;
use std::collections::BTreeSet;

use stock_quest_core::errors::CoreError;
use stock_quest_core::models::content::{ContentResponse, LearningContent};
use stock_quest_core::models::difficulty::Difficulty;
use stock_quest_core::models::profile::ThemeCluster;
use stock_quest_core::models::question::Question;
use stock_quest_core::models::quiz::{Answer, CorrectAnswer, QuizItem, QuizKind};
use stock_quest_core::models::reward::{CollectionReceipt, StarRating};
use stock_quest_core::models::stock::{InvestStyle, RiskLevel, Stock};
use stock_quest_core::services::fetch_gate::FetchGate;
use stock_quest_core::services::learning_flow::{LearningSession, Phase, Step};
use stock_quest_core::services::profile_service::{all_type_codes, profile_for_code, ProfileService};
use stock_quest_core::services::question_service::{QuestionSelection, ToggleOutcome};
use stock_quest_core::services::quick_learn::{QuickLearnSession, QuickLearnStep, QUICK_LEARN_LENGTH};
use stock_quest_core::services::quiz_service::QuizService;
use stock_quest_core::services::swipe_service::{SwipeDirection, SwipeSession};

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

fn stock(id: i64, sector: &str, industry: &str, style: InvestStyle, risk: RiskLevel) -> Stock {
    Stock::new(id, format!("stock-{id}"), format!("{id:06}"), sector, industry)
        .with_style(style)
        .with_risk(risk)
}

fn deck(n: i64) -> Vec<Stock> {
    (1..=n)
        .map(|i| Stock::new(i, format!("s{i}"), format!("{i}"), "消费", "白酒").normalize())
        .collect()
}

fn questions() -> Vec<Question> {
    vec![
        Question::new(1, "Q1"),
        Question::new(2, "Q2"),
        Question::new(3, "Q3"),
    ]
}

/// Content with `per_section` single-choice items (correct answer 0) in
/// sections 1..=4 and one analysis-quiz item.
fn content(per_section: usize) -> LearningContent {
    let quiz = |s: u8| -> serde_json::Value {
        (0..per_section)
            .map(|i| json!({ "id": format!("s{s}-{i}"), "type": "single", "question": "q", "options": ["right", "wrong"], "correct_answer": 0 }))
            .collect()
    };
    let resp: ContentResponse = serde_json::from_value(json!({
        "success": true,
        "content": { "section1": "a", "section2": "b", "section3": "c", "section4": "d", "section5": "e" },
        "section_quizzes": { "1": quiz(1), "2": quiz(2), "3": quiz(3), "4": quiz(4) },
        "question_analysis": "analysis",
        "analysis_quiz": [
            { "id": "qa-1", "type": "single", "question": "q", "options": ["right", "wrong"], "correct_answer": 0 }
        ],
        "unlocked_difficulties": ["simple"]
    }))
    .unwrap();
    resp.into_content().unwrap()
}

fn session(per_section: usize) -> LearningSession {
    LearningSession::new(
        "u1",
        Stock::new(9, "贵州茅台", "600519", "消费", "白酒").normalize(),
        vec![Question::new(1, "Q1")],
        Difficulty::Simple,
        content(per_section),
    )
    .unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// ProfileService
// ═══════════════════════════════════════════════════════════════════

mod profile {
    use super::*;

    #[test]
    fn cautious_three_stock_pick_is_istj() {
        let liked = vec![
            stock(1, "消费", "白酒", InvestStyle::Value, RiskLevel::Low),
            stock(2, "新能源", "电池", InvestStyle::Growth, RiskLevel::High),
            stock(3, "金融", "银行", InvestStyle::Value, RiskLevel::Low),
        ];
        let profile = ProfileService::new().analyze(&liked);
        assert_eq!(profile.type_code, "ISTJ");
        assert!(!profile.is_fallback);
    }

    #[test]
    fn empty_selection_returns_fallback() {
        let profile = ProfileService::new().analyze(&[]);
        assert_eq!(profile.type_code, "ISTJ");
        assert_eq!(profile.name, "谨慎观察者");
        assert!(profile.is_fallback);
        assert_eq!(profile.stats.total(), 0);
    }

    #[test]
    fn analysis_is_deterministic() {
        let liked = vec![
            stock(1, "科技", "半导体", InvestStyle::Growth, RiskLevel::Medium),
            stock(2, "新能源", "光伏", InvestStyle::Growth, RiskLevel::High),
            stock(3, "医药", "创新药", InvestStyle::Balanced, RiskLevel::Medium),
            stock(4, "消费", "家电", InvestStyle::Value, RiskLevel::Low),
        ];
        let svc = ProfileService::new();
        let a = svc.analyze(&liked);
        let b = svc.analyze(&liked);
        assert_eq!(a, b);
    }

    #[test]
    fn four_sectors_is_e_three_is_i() {
        let svc = ProfileService::new();
        let mut liked = vec![
            stock(1, "A", "x", InvestStyle::Value, RiskLevel::Low),
            stock(2, "B", "x", InvestStyle::Value, RiskLevel::Low),
            stock(3, "C", "x", InvestStyle::Value, RiskLevel::Low),
        ];
        assert!(svc.type_code(&liked).starts_with('I'));
        liked.push(stock(4, "D", "x", InvestStyle::Value, RiskLevel::Low));
        assert!(svc.type_code(&liked).starts_with('E'));
    }

    #[test]
    fn growth_value_tie_is_s() {
        let liked = vec![
            stock(1, "A", "x", InvestStyle::Growth, RiskLevel::Low),
            stock(2, "A", "x", InvestStyle::Growth, RiskLevel::Low),
            stock(3, "A", "x", InvestStyle::Value, RiskLevel::Low),
            stock(4, "A", "x", InvestStyle::Value, RiskLevel::Low),
        ];
        assert_eq!(ProfileService::new().type_code(&liked).chars().nth(1), Some('S'));
    }

    #[test]
    fn more_growth_is_n() {
        let liked = vec![
            stock(1, "A", "x", InvestStyle::Growth, RiskLevel::Low),
            stock(2, "A", "x", InvestStyle::Growth, RiskLevel::Low),
            stock(3, "A", "x", InvestStyle::Value, RiskLevel::Low),
        ];
        assert_eq!(ProfileService::new().type_code(&liked).chars().nth(1), Some('N'));
    }

    #[test]
    fn risk_tie_is_f_and_balanced_heavy_is_f() {
        let svc = ProfileService::new();
        let tie = vec![
            stock(1, "A", "x", InvestStyle::Value, RiskLevel::High),
            stock(2, "A", "x", InvestStyle::Value, RiskLevel::Low),
        ];
        assert_eq!(svc.type_code(&tie).chars().nth(2), Some('F'));

        let medium = vec![
            stock(1, "A", "x", InvestStyle::Balanced, RiskLevel::Medium),
            stock(2, "A", "x", InvestStyle::Balanced, RiskLevel::Medium),
        ];
        assert_eq!(svc.type_code(&medium).chars().nth(2), Some('F'));
    }

    #[test]
    fn three_industries_is_j_four_is_p() {
        let svc = ProfileService::new();
        let mut liked = vec![
            stock(1, "A", "i1", InvestStyle::Value, RiskLevel::Low),
            stock(2, "A", "i2", InvestStyle::Value, RiskLevel::Low),
            stock(3, "A", "i3", InvestStyle::Value, RiskLevel::Low),
        ];
        assert!(svc.type_code(&liked).ends_with('J'));
        liked.push(stock(4, "A", "i4", InvestStyle::Value, RiskLevel::Low));
        assert!(svc.type_code(&liked).ends_with('P'));
    }

    #[test]
    fn stats_are_zero_filled() {
        let liked = vec![
            stock(1, "消费", "白酒", InvestStyle::Value, RiskLevel::Low),
            stock(2, "消费", "乳业", InvestStyle::Value, RiskLevel::Low),
            stock(3, "科技", "芯片", InvestStyle::Growth, RiskLevel::High),
        ];
        let stats = ProfileService::new().stats(&liked);
        assert_eq!(stats.by_sector.get("消费"), Some(&2));
        assert_eq!(stats.by_sector.get("科技"), Some(&1));
        assert_eq!(stats.by_style.get(&InvestStyle::Balanced), Some(&0));
        assert_eq!(stats.by_style.get(&InvestStyle::Value), Some(&2));
        assert_eq!(stats.by_risk.get(&RiskLevel::Medium), Some(&0));
        assert_eq!(stats.by_risk.get(&RiskLevel::High), Some(&1));
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn all_sixteen_types_have_profiles() {
        let codes = all_type_codes();
        assert_eq!(codes.len(), 16);
        let unique: BTreeSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), 16);
        for code in codes {
            let p = profile_for_code(code);
            assert_eq!(p.type_code, code);
            assert!(!p.name.is_empty());
            assert_eq!(p.traits.len(), 3);
        }
    }

    #[test]
    fn unknown_code_falls_back_to_istj() {
        assert_eq!(profile_for_code("XXXX").type_code, "ISTJ");
    }

    #[test]
    fn themes_partition_into_four_clusters() {
        let svc = ProfileService::new();
        assert_eq!(svc.theme("INTJ").cluster, ThemeCluster::Analyst);
        assert_eq!(svc.theme("ENTP").color, "purple");
        assert_eq!(svc.theme("INFP").cluster, ThemeCluster::Diplomat);
        assert_eq!(svc.theme("ENFJ").color, "green");
        assert_eq!(svc.theme("ISTJ").cluster, ThemeCluster::Sentinel);
        assert_eq!(svc.theme("ESFJ").color, "blue");
        assert_eq!(svc.theme("ISTP").cluster, ThemeCluster::Explorer);
        assert_eq!(svc.theme("ESFP").color, "orange");

        let mut counts = std::collections::HashMap::new();
        for code in all_type_codes() {
            *counts.entry(svc.theme(code).cluster).or_insert(0) += 1;
        }
        assert!(counts.values().all(|&c| c == 4));
    }
}

// ═══════════════════════════════════════════════════════════════════
// SwipeSession
// ═══════════════════════════════════════════════════════════════════

mod swipe {
    use super::*;

    #[test]
    fn counts_stay_consistent() {
        let mut s = SwipeSession::new(deck(20), 15);
        let dirs = [SwipeDirection::Right, SwipeDirection::Left, SwipeDirection::Right];
        for i in 0..15 {
            s.record_swipe(dirs[i % dirs.len()]).unwrap();
            assert_eq!(s.swipe_count(), s.liked().len() + s.disliked().len());
            assert_eq!(s.current_index(), s.swipe_count());
        }
        assert_eq!(s.liked().len(), 10);
        assert_eq!(s.disliked().len(), 5);
    }

    #[test]
    fn target_completes_session() {
        let mut s = SwipeSession::new(deck(20), 15);
        for _ in 0..14 {
            assert!(!s.record_swipe(SwipeDirection::Left).unwrap().completed);
        }
        assert!(s.record_swipe(SwipeDirection::Right).unwrap().completed);
        assert!(s.is_complete());
        assert_eq!(s.remaining(), 0);
    }

    #[test]
    fn short_deck_completes_before_target() {
        let mut s = SwipeSession::new(deck(10), 15);
        for _ in 0..10 {
            s.record_swipe(SwipeDirection::Right).unwrap();
        }
        assert!(s.is_complete());
        assert_eq!(s.swipe_count(), 10);
        assert_eq!(s.current_index(), 10);
    }

    #[test]
    fn swiping_a_complete_session_fails_and_changes_nothing() {
        let mut s = SwipeSession::new(deck(2), 15);
        s.record_swipe(SwipeDirection::Right).unwrap();
        s.record_swipe(SwipeDirection::Left).unwrap();
        let err = s.record_swipe(SwipeDirection::Right).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(s.swipe_count(), 2);
        assert!(s.is_complete());
    }

    #[test]
    fn empty_deck_is_complete_immediately() {
        let s = SwipeSession::new(Vec::new(), 15);
        assert!(s.is_complete());
        assert!(s.current().is_none());
    }

    #[test]
    fn right_swipe_goes_to_liked() {
        let mut s = SwipeSession::new(deck(3), 15);
        let first = s.current().unwrap().id;
        let rec = s.record_swipe(SwipeDirection::Right).unwrap();
        assert_eq!(rec.stock.id, first);
        assert_eq!(s.liked()[0].id, first);
        assert_eq!(s.remaining(), 2);
    }

    #[test]
    fn action_types() {
        assert_eq!(SwipeDirection::Left.action_type(), "swipe_left");
        assert_eq!(SwipeDirection::Right.action_type(), "swipe_right");
    }
}

// ═══════════════════════════════════════════════════════════════════
// QuestionSelection
// ═══════════════════════════════════════════════════════════════════

mod question_selection {
    use super::*;

    fn ids(sel: &QuestionSelection) -> Vec<i64> {
        sel.selected().iter().map(|q| q.id).collect()
    }

    #[test]
    fn toggle_sequence_respects_the_cap() {
        let mut sel = QuestionSelection::new(1, questions());
        assert_eq!(sel.toggle(1).unwrap(), ToggleOutcome::Selected);
        assert_eq!(ids(&sel), vec![1]);
        sel.toggle(2).unwrap();
        assert_eq!(ids(&sel), vec![1, 2]);

        let err = sel.toggle(3).unwrap_err();
        assert!(matches!(err, CoreError::SelectionLimit { limit: 2 }));
        assert_eq!(ids(&sel), vec![1, 2]);

        assert_eq!(sel.toggle(1).unwrap(), ToggleOutcome::Deselected);
        assert_eq!(ids(&sel), vec![2]);
    }

    #[test]
    fn confirm_requires_a_selection() {
        let mut sel = QuestionSelection::new(1, questions());
        assert!(matches!(sel.confirm(), Err(CoreError::NoQuestionSelected)));
        sel.toggle(3).unwrap();
        sel.toggle(1).unwrap();
        assert_eq!(sel.confirm().unwrap().id, 3);
        assert_eq!(sel.primary().unwrap().id, 3);
        assert_eq!(sel.secondary().unwrap().id, 1);
    }

    #[test]
    fn unknown_question_is_rejected() {
        let mut sel = QuestionSelection::new(1, questions());
        assert!(matches!(sel.toggle(99), Err(CoreError::ValidationError(_))));
        assert!(sel.selected().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════
// QuizService
// ═══════════════════════════════════════════════════════════════════

mod quiz {
    use super::*;

    fn item(kind: QuizKind, correct: CorrectAnswer) -> QuizItem {
        QuizItem {
            id: "q".into(),
            kind,
            prompt: "p".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct,
            explanation: "because".into(),
        }
    }

    #[test]
    fn single_exact_index() {
        let svc = QuizService::new();
        let q = item(QuizKind::Single, CorrectAnswer::Index(2));
        assert!(svc.evaluate(&q, &Answer::Choice(2)).unwrap());
        assert!(!svc.evaluate(&q, &Answer::Choice(1)).unwrap());
    }

    #[test]
    fn multiple_is_order_independent() {
        let svc = QuizService::new();
        let q = item(QuizKind::Multiple, CorrectAnswer::Set(BTreeSet::from([0, 2, 3])));
        assert!(svc.evaluate(&q, &Answer::Choices(vec![3, 0, 2])).unwrap());
        assert!(svc.evaluate(&q, &Answer::Choices(vec![0, 2, 3])).unwrap());
    }

    #[test]
    fn multiple_subset_superset_disjoint_are_wrong() {
        let svc = QuizService::new();
        let q = item(QuizKind::Multiple, CorrectAnswer::Set(BTreeSet::from([0, 2])));
        assert!(!svc.evaluate(&q, &Answer::Choices(vec![0])).unwrap());
        assert!(!svc.evaluate(&q, &Answer::Choices(vec![0, 1, 2])).unwrap());
        assert!(!svc.evaluate(&q, &Answer::Choices(vec![1, 3])).unwrap());
        assert!(!svc.evaluate(&q, &Answer::Choices(vec![])).unwrap());
    }

    #[test]
    fn sort_requires_exact_order() {
        let svc = QuizService::new();
        let q = item(QuizKind::Sort, CorrectAnswer::Order(vec![3, 1, 0, 2]));
        assert!(svc.evaluate(&q, &Answer::Order(vec![3, 1, 0, 2])).unwrap());
        assert!(!svc.evaluate(&q, &Answer::Order(vec![1, 3, 0, 2])).unwrap());
    }

    #[test]
    fn any_of_accepts_each_listed_index() {
        let svc = QuizService::new();
        let q = item(QuizKind::Single, CorrectAnswer::AnyOf(BTreeSet::from([0, 2])));
        assert!(svc.evaluate(&q, &Answer::Choice(0)).unwrap());
        assert!(svc.evaluate(&q, &Answer::Choice(2)).unwrap());
        assert!(!svc.evaluate(&q, &Answer::Choice(1)).unwrap());
    }

    #[test]
    fn wrong_answer_shape_is_rejected() {
        let svc = QuizService::new();
        let q = item(QuizKind::Single, CorrectAnswer::Index(0));
        assert!(matches!(
            svc.evaluate(&q, &Answer::Choices(vec![0])),
            Err(CoreError::AnswerMismatch(_))
        ));
    }

    #[test]
    fn missing_option_is_rejected() {
        let svc = QuizService::new();
        let q = item(QuizKind::Single, CorrectAnswer::Index(0));
        assert!(matches!(svc.evaluate(&q, &Answer::Choice(4)), Err(CoreError::AnswerMismatch(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════
// LearningSession
// ═══════════════════════════════════════════════════════════════════

mod learning_flow {
    use super::*;

    #[test]
    fn forward_walk_visits_every_phase_in_order() {
        let mut s = session(2);
        let mut cursors = vec![s.phase().cursor()];
        loop {
            if s.current_quiz().is_some() {
                s.answer(&Answer::Choice(0)).unwrap();
                if matches!(s.phase(), Phase::Section(_)) {
                    cursors.push(s.phase().cursor());
                }
                continue;
            }
            match s.next().unwrap() {
                Step::Moved(p) => cursors.push(p.cursor()),
                Step::ReadyToComplete(req) => {
                    assert_eq!(req.stock_id, 9);
                    assert_eq!(req.difficulty, Difficulty::Simple);
                    break;
                }
            }
        }
        assert_eq!(
            cursors,
            vec![0.0, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0]
        );
        let done = s.complete(CollectionReceipt { success: true, ..Default::default() }).unwrap();
        assert_eq!(s.phase(), Phase::Complete);
        assert_eq!(done.correct_count, 8);
        assert_eq!(done.total_points, 80);
    }

    #[test]
    fn answering_last_item_moves_to_next_section() {
        let mut s = session(1);
        s.next().unwrap(); // 1
        s.next().unwrap(); // 1.5
        s.answer(&Answer::Choice(0)).unwrap(); // 2
        assert_eq!(s.phase(), Phase::Section(2));
        s.next().unwrap(); // 2.5
        assert_eq!(s.phase(), Phase::SectionQuiz(2));

        let result = s.answer(&Answer::Choice(0)).unwrap();
        assert!(result.outcome.correct);
        assert_eq!(result.outcome.points, 10);
        assert_eq!(result.remaining, 0);
        assert_eq!(result.phase, Phase::Section(3));
        assert_eq!(s.phase().cursor(), 3.0);
        assert_eq!(s.total_points(), 20);
    }

    #[test]
    fn wrong_section_answer_earns_nothing_but_advances_the_quiz() {
        let mut s = session(2);
        s.next().unwrap();
        s.next().unwrap();
        let result = s.answer(&Answer::Choice(1)).unwrap();
        assert!(!result.outcome.correct);
        assert_eq!(result.outcome.points, 0);
        assert_eq!(result.remaining, 1);
        assert_eq!(s.phase(), Phase::SectionQuiz(1));
        assert_eq!(s.quiz_index(1), 1);
    }

    #[test]
    fn cannot_skip_a_pending_quiz() {
        let mut s = session(2);
        s.next().unwrap();
        s.next().unwrap();
        let err = s.next().unwrap_err();
        assert!(matches!(err, CoreError::QuizPending { section: 1, remaining: 2 }));
        assert_eq!(s.phase(), Phase::SectionQuiz(1));
    }

    #[test]
    fn backward_navigation() {
        let mut s = session(1);
        assert!(s.previous().is_err());
        s.next().unwrap(); // 1
        assert_eq!(s.previous().unwrap(), Phase::QuestionAnalysis);
        s.next().unwrap(); // 1
        s.next().unwrap(); // 1.5
        assert_eq!(s.previous().unwrap(), Phase::Section(1));
        s.next().unwrap(); // 1.5
        s.answer(&Answer::Choice(0)).unwrap(); // 2
        assert_eq!(s.previous().unwrap(), Phase::SectionQuiz(1));
        // exhausted quiz: going forward skips straight back to section 2
        assert!(s.current_quiz().is_none());
        assert!(matches!(s.answer(&Answer::Choice(0)), Err(CoreError::AlreadyAnswered)));
        assert_eq!(s.next().unwrap(), Step::Moved(Phase::Section(2)));
        assert_eq!(s.total_points(), 10);
    }

    #[test]
    fn section_five_has_no_quiz() {
        let mut s = session(1);
        for _ in 0..4 {
            s.next().unwrap();
            s.next().unwrap();
            s.answer(&Answer::Choice(0)).unwrap();
        }
        assert_eq!(s.phase(), Phase::Section(5));
        assert!(matches!(s.next().unwrap(), Step::ReadyToComplete(_)));
        // still on section 5 until the completion is applied
        assert_eq!(s.phase(), Phase::Section(5));
        assert_eq!(s.previous().unwrap(), Phase::SectionQuiz(4));
    }

    #[test]
    fn complete_only_from_section_five() {
        let mut s = session(1);
        let err = s.complete(CollectionReceipt::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
        assert_eq!(s.phase(), Phase::QuestionAnalysis);
    }

    #[test]
    fn analysis_quiz_rewards_wrong_answers() {
        let mut s = session(1);
        let outcome = s.answer_analysis(&Answer::Choice(1)).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.points, 3);
        assert!(matches!(s.answer_analysis(&Answer::Choice(0)), Err(CoreError::AlreadyAnswered)));
        assert_eq!(s.total_points(), 3);
        s.next().unwrap();
        assert!(matches!(
            s.answer_analysis(&Answer::Choice(0)),
            Err(CoreError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn answer_outside_quiz_phase_is_rejected() {
        let mut s = session(1);
        assert!(matches!(s.answer(&Answer::Choice(0)), Err(CoreError::InvalidTransition { .. })));
    }

    #[test]
    fn locked_difficulty_is_refused() {
        let err = LearningSession::new(
            "u1",
            Stock::new(1, "a", "1", "消费", "白酒"),
            vec![Question::new(1, "Q1")],
            Difficulty::Master,
            content(1),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::DifficultyLocked(ref d) if d == "master"));
    }

    #[test]
    fn needs_a_question() {
        let err = LearningSession::new(
            "u1",
            Stock::new(1, "a", "1", "消费", "白酒"),
            vec![],
            Difficulty::Simple,
            content(1),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::NoQuestionSelected));
    }

    #[test]
    fn progress_tracks_steps() {
        let mut s = session(1);
        assert_eq!(s.progress().step, 0);
        s.next().unwrap();
        s.next().unwrap();
        let p = s.progress();
        assert_eq!(p.step, 2);
        assert_eq!(p.total_steps, 10);
        assert!((p.percent - 20.0).abs() < 1e-9);
    }

    #[test]
    fn current_section_follows_phase() {
        let mut s = session(1);
        assert!(s.current_section().is_none());
        s.next().unwrap();
        assert_eq!(s.current_section().unwrap().body, "a");
    }
}

// ═══════════════════════════════════════════════════════════════════
// QuickLearnSession
// ═══════════════════════════════════════════════════════════════════

mod quick_learn {
    use super::*;

    fn correct_choice(item: &QuizItem) -> usize {
        match &item.correct {
            CorrectAnswer::Index(i) => *i,
            CorrectAnswer::AnyOf(set) => *set.iter().next().unwrap(),
            other => panic!("unexpected answer shape {other:?}"),
        }
    }

    fn wrong_choice(item: &QuizItem) -> usize {
        (0..item.options.len())
            .find(|&i| match &item.correct {
                CorrectAnswer::Index(c) => i != *c,
                CorrectAnswer::AnyOf(set) => !set.contains(&i),
                _ => false,
            })
            .unwrap()
    }

    fn new_session() -> QuickLearnSession {
        QuickLearnSession::new(
            Stock::new(42, "宁德时代", "300750", "新能源", "电池").normalize(),
            Question::new(1, "宁德时代的护城河是什么?"),
        )
    }

    #[test]
    fn generates_five_valid_items() {
        let s = new_session();
        assert_eq!(s.items().len(), QUICK_LEARN_LENGTH);
        for item in s.items() {
            let idx = correct_choice(&item.quiz);
            assert!(idx < item.quiz.options.len());
            assert!(!item.knowledge.is_empty());
        }
        assert!(s.items()[3].quiz.prompt.contains("护城河"));
    }

    #[test]
    fn four_of_five_is_two_stars() {
        let mut s = new_session();
        let mut last = None;
        for i in 0..QUICK_LEARN_LENGTH {
            let quiz = s.current().unwrap().quiz.clone();
            let choice = if i == 2 { wrong_choice(&quiz) } else { correct_choice(&quiz) };
            let feedback = s.answer(choice).unwrap();
            assert!(!feedback.knowledge.is_empty());
            last = Some(s.next().unwrap());
        }
        match last.unwrap() {
            QuickLearnStep::Finished(summary) => {
                assert_eq!(summary.correct_count, 4);
                assert!((summary.accuracy_pct - 80.0).abs() < 1e-9);
                assert_eq!(summary.stars, StarRating(2));
                assert_eq!(summary.points, 40);
            }
            other => panic!("expected Finished, got {other:?}"),
        }
        assert_eq!(s.knowledge_cards().len(), 5);
    }

    #[test]
    fn wrong_answer_still_reveals_explanation() {
        let mut s = new_session();
        let quiz = s.current().unwrap().quiz.clone();
        let fb = s.answer(wrong_choice(&quiz)).unwrap();
        assert!(!fb.outcome.correct);
        assert_eq!(fb.outcome.points, 0);
        assert!(!fb.outcome.explanation.is_empty());
    }

    #[test]
    fn any_accepted_answer_counts() {
        let mut s = new_session();
        for _ in 0..3 {
            s.next().unwrap();
        }
        assert!(s.answer(2).unwrap().outcome.correct);
    }

    #[test]
    fn one_answer_per_item() {
        let mut s = new_session();
        s.answer(0).unwrap();
        assert!(matches!(s.answer(0), Err(CoreError::AlreadyAnswered)));
    }

    #[test]
    fn skipping_everything_earns_zero_stars() {
        let mut s = new_session();
        for _ in 0..QUICK_LEARN_LENGTH {
            s.next().unwrap();
        }
        let summary = s.summary();
        assert_eq!(summary.attempted, 0);
        assert_eq!(summary.stars, StarRating(0));
        assert!(s.is_finished());
        assert!(s.next().is_err());
        assert!(s.answer(0).is_err());
    }

    #[test]
    fn perfect_run_is_three_stars() {
        let mut s = new_session();
        for _ in 0..QUICK_LEARN_LENGTH {
            let quiz = s.current().unwrap().quiz.clone();
            s.answer(correct_choice(&quiz)).unwrap();
            s.next().unwrap();
        }
        assert_eq!(s.summary().stars, StarRating(3));
        assert_eq!(s.correct_count(), 5);
    }
}

// ═══════════════════════════════════════════════════════════════════
// FetchGate
// ═══════════════════════════════════════════════════════════════════

mod fetch_gate {
    use super::*;

    #[test]
    fn second_request_is_refused_while_busy() {
        let mut gate = FetchGate::new();
        let t = gate.begin("content").unwrap();
        assert!(matches!(gate.begin("questions"), Err(CoreError::Busy(ref l)) if l == "content"));
        gate.settle(&t).unwrap();
        assert!(!gate.is_busy());
        assert!(gate.begin("questions").is_ok());
    }

    #[test]
    fn invalidated_ticket_is_stale() {
        let mut gate = FetchGate::new();
        let t = gate.begin("content").unwrap();
        gate.invalidate();
        assert!(!gate.is_busy());
        assert!(matches!(gate.settle(&t), Err(CoreError::StaleResponse)));
        assert!(gate.begin("content").is_ok());
    }

    #[test]
    fn dropped_guard_releases_the_gate() {
        let mut gate = FetchGate::new();
        let t = gate.begin("stocks").unwrap();
        let guard = gate.guard(&t);
        assert!(gate.is_busy());

        drop(guard);
        assert!(!gate.is_busy());
        let next = gate.begin("stocks").unwrap();
        assert!(matches!(gate.settle(&t), Err(CoreError::StaleResponse)));
        assert!(gate.settle(&next).is_ok());
    }

    #[test]
    fn guard_dropped_after_settling_changes_nothing() {
        let mut gate = FetchGate::new();
        let first = gate.begin("stocks").unwrap();
        let guard = gate.guard(&first);
        gate.settle(&first).unwrap();

        let second = gate.begin("questions").unwrap();
        drop(guard);
        assert!(gate.is_busy());
        assert!(matches!(gate.begin("content"), Err(CoreError::Busy(ref l)) if l == "questions"));
        assert!(gate.settle(&second).is_ok());
    }
}
