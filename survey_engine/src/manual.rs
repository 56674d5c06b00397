/*!

This is the long-form manual for `survey_engine` and `npsurvey`.

## Library

The library has two independent parts:
* [`crate::flow::Session`] walks one respondent through a [`crate::Survey`] and
  returns an [`crate::AnswerSet`] once submitted.
* the aggregation functions ([`crate::summarize_overall`], [`crate::summarize_by_key`],
  [`crate::summarize_by_month`], [`crate::recent_responses`] and [`crate::build_report`])
  turn stored [`crate::ResponseRecord`]s into statistics.

### Question flow

A session has a cursor that points to a question or to the review step that
follows the last question.

| Operation | Effect | Error |
|-----------|--------|-------|
| `answer`  | records the value for the current question. Choice questions then move forward | `InvalidAnswer` |
| `advance` | moves forward, to the review step after the last question | `IncompleteQuestion` |
| `back`    | moves backward and forgets the answer of the question that becomes current | `AtStart` |
| `submit`  | returns the answers, only from the review step | `NotAtReview`, `IncompleteSurvey` |
| `abandon` | drops the session | |

Errors never end the session: the current question can be presented again.
Once submitted, the session refuses every operation with `Terminated`.

### Scores

| Score  | Tier      |
|--------|-----------|
| 0 - 6  | detractor |
| 7 - 8  | passive   |
| 9 - 10 | promoter  |

The net score is `(promoters - detractors) / responses with a score * 100`, rounded
to the nearest integer with ties away from zero. The mean score is rounded to one
decimal. Both are absent (`null` in JSON) when no response carries a score.
Responses with a missing score or a score outside of 0 - 10 still count in the totals.

## Input formats

### Survey definition

Used by `npsurvey take`. Questions and options are sorted by their `order` field.

```json
{
  "id": "s-1",
  "slug": "after-checkout",
  "active": true,
  "questions": [
    { "id": "nps", "title": "How likely are you to recommend us?", "type": "score", "order": 1 },
    { "id": "channel", "title": "Where did you buy?", "type": "choice", "order": 2,
      "options": [ { "id": "web", "label": "Website", "order": 1 },
                   { "id": "shop", "label": "Shop", "order": 2 } ] }
  ]
}
```

### `json` responses

```json
{
  "responses": [
    { "id": "r1", "campaignId": "c1", "campaignName": "Spring", "unitId": "u1",
      "unitName": "North", "score": 9, "submittedAt": "2024-03-01T10:00:00Z" }
  ]
}
```

`unitId`, `unitName` and `score` are optional. A document without a `responses`
array is refused.

### `csv` responses

```text
id,campaignId,campaignName,unitId,unitName,score,submittedAt
r1,c1,Spring,u1,North,9,2024-03-01T10:00:00Z
,c1,Spring,,,,2024-03-02T08:30:00Z
```

The first row names the columns, in any order. `unitId`, `unitName` and `score`
may be left empty. An empty `id` is replaced by the file name and the line number
padded to 8 digits, for example `kiosk.csv-00000003`.
A score that is not a number is treated as missing.
A response whose `submittedAt` is not a valid RFC 3339 timestamp is skipped
with a warning, in both the JSON and the CSV formats.

## Configuration

`npsurvey report` accepts a configuration file in JSON:

```json
{
  "outputSettings": { "reportName": "Spring pulse", "outputPath": "report.json" },
  "responseSources": [ { "provider": "json", "filePath": "responses.json" },
                       { "provider": "csv", "filePath": "kiosk.csv" } ],
  "rules": { "recentLimit": 5, "utcOffsetMinutes": 60 }
}
```

File paths are relative to the directory of the configuration file. The `rules`
section and each of its fields are optional.

Command line flags take precedence over the configuration file:
 - `--input` and `--input-type` replace the response sources
 - `--out` replaces `outputPath` (`stdout` prints the report)
 - `--recent-limit` and `--utc-offset-minutes` replace the rules

 */
